//! Event handler storage for layout elements
//!
//! ```text
//! Div
//!     ↓ .on_click(|e| ...)
//! EventHandlers (stored on element)
//!     ↓ moved into RenderTree on mount
//! RenderTree (handlers indexed by LayoutNodeId)
//!     ↓ EventRouter routes event
//! Handler callback invoked
//! ```

use std::cell::Cell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xenon_core::{Point, PointerButton, Vec2};

use crate::tree::LayoutNodeId;

/// Element-level event kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    /// Press and release on the same element
    Click,
    HoverEnter,
    HoverLeave,
    Scroll,
}

impl EventKind {
    /// Whether the event walks up the ancestor chain after the target
    pub fn bubbles(&self) -> bool {
        !matches!(self, EventKind::HoverEnter | EventKind::HoverLeave)
    }
}

/// Callback for handling events
///
/// Uses Rc since UI is single-threaded.
pub type EventCallback = Rc<dyn Fn(&EventContext)>;

/// Context passed to event handlers
#[derive(Clone, Debug)]
pub struct EventContext {
    pub kind: EventKind,
    /// The node whose handler is running
    pub node_id: LayoutNodeId,
    /// The node the event was originally aimed at
    pub target: LayoutNodeId,
    pub pointer_id: u32,
    pub button: PointerButton,
    /// Pointer position in tree space
    pub position: Point,
    /// Position relative to `node_id`'s bounds
    pub local: Point,
    /// Wheel delta for scroll events
    pub scroll_delta: Vec2,
    stopped: Cell<bool>,
}

impl EventContext {
    pub fn new(kind: EventKind, node_id: LayoutNodeId) -> Self {
        Self {
            kind,
            node_id,
            target: node_id,
            pointer_id: 0,
            button: PointerButton::Primary,
            position: Point::ZERO,
            local: Point::ZERO,
            scroll_delta: Vec2::ZERO,
            stopped: Cell::new(false),
        }
    }

    /// Stop the event from reaching further ancestors
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Storage for event handlers on an element
#[derive(Default, Clone)]
pub struct EventHandlers {
    handlers: FxHashMap<EventKind, SmallVec<[EventCallback; 1]>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn has_handler(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Register a handler for an event kind
    pub fn on<F>(&mut self, kind: EventKind, handler: F)
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.entry(kind).or_default().push(Rc::new(handler));
    }

    /// Handlers registered for `kind`, cheap to clone out of the tree
    pub fn callbacks(&self, kind: EventKind) -> SmallVec<[EventCallback; 1]> {
        self.handlers.get(&kind).cloned().unwrap_or_default()
    }

    /// Run every handler for `ctx.kind`, returning how many ran
    pub fn dispatch(&self, ctx: &EventContext) -> usize {
        let Some(handlers) = self.handlers.get(&ctx.kind) else {
            return 0;
        };
        for handler in handlers {
            handler(ctx);
        }
        handlers.len()
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dispatch_runs_matching_handlers() {
        let count = Arc::new(AtomicU32::new(0));
        let mut handlers = EventHandlers::new();
        for _ in 0..2 {
            let c = count.clone();
            handlers.on(EventKind::Click, move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }

        let ctx = EventContext::new(EventKind::Click, LayoutNodeId::default());
        assert_eq!(handlers.dispatch(&ctx), 2);
        let ctx = EventContext::new(EventKind::PointerDown, LayoutNodeId::default());
        assert_eq!(handlers.dispatch(&ctx), 0);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_hover_does_not_bubble() {
        assert!(!EventKind::HoverEnter.bubbles());
        assert!(EventKind::Scroll.bubbles());
    }
}
