//! Contract between a UI toolkit and the frame bridge
//!
//! The bridge never reaches into toolkit internals: everything it needs to
//! drive a frame, inject input and inspect the tree goes through
//! [`SceneRoot`].

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::dirty::DirtyFlag;
use crate::error::FlushError;
use crate::geometry::{Color, Point, Rect};
use crate::input::{PointerInput, WheelInput};
use crate::surface::{PixelBuffer, Viewport};

/// Summary of one flushed frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Nodes visited by layout
    pub nodes: usize,
    /// Draw commands recorded by paint
    pub draw_commands: usize,
}

/// Result of dispatching one synthetic event
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The event position hit at least one node
    pub hit: bool,
    /// Number of handler invocations
    pub handled: usize,
}

/// Deferred element handler; returns how many callbacks it ran
pub type PendingHandler = Box<dyn FnOnce() -> usize>;

/// A dispatched event whose element handlers have not run yet
///
/// The root applies its own state changes (hover, scroll, dirty) while
/// dispatching and hands the handlers back here. Hosts run them with
/// [`Dispatch::run`] once the root is no longer borrowed, so a handler may
/// reach back into the tree that produced it.
#[derive(Default)]
#[must_use = "element handlers only run when the dispatch is run"]
pub struct Dispatch {
    /// The event position hit at least one node
    pub hit: bool,
    handlers: Vec<PendingHandler>,
}

impl Dispatch {
    pub fn new(hit: bool) -> Self {
        Self {
            hit,
            handlers: Vec::new(),
        }
    }

    /// Queue a handler, run in insertion order
    pub fn defer(&mut self, handler: impl FnOnce() -> usize + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Number of queued handlers
    pub fn pending(&self) -> usize {
        self.handlers.len()
    }

    /// Run every queued handler
    pub fn run(self) -> DispatchOutcome {
        let handled = self.handlers.into_iter().map(|handler| handler()).sum();
        DispatchOutcome {
            hit: self.hit,
            handled,
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("hit", &self.hit)
            .field("pending", &self.handlers.len())
            .finish()
    }
}

/// A mountable UI root the bridge can drive
pub trait SceneRoot {
    /// Update the logical size / pixel ratio the tree lays out against
    fn set_viewport(&mut self, viewport: Viewport);

    /// The flag this tree raises whenever layout or paint state changes
    fn dirty_flag(&self) -> DirtyFlag;

    /// Run layout, paint and composite into `target`
    ///
    /// `target` is sized to the viewport's physical size. The caller owns the
    /// dirty flag lifecycle.
    fn flush_frame(&mut self, target: &mut PixelBuffer) -> Result<FrameStats, FlushError>;

    /// Hit test a pointer event and collect its handlers
    fn dispatch_pointer(&mut self, input: PointerInput) -> Dispatch;

    /// Hit test a wheel event, apply scrolling and collect its handlers
    fn dispatch_wheel(&mut self, input: WheelInput) -> Dispatch;

    /// Structural snapshot for diagnostics
    fn snapshot(&self) -> SceneSnapshot;
}

/// One node of a [`SceneSnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneNodeSnapshot {
    /// User-assigned element id
    pub id: Option<String>,
    /// Element kind (`"div"`, `"scroll"`, ...)
    pub kind: String,
    /// Absolute bounds in logical pixels, scroll offsets applied
    pub bounds: Rect,
    pub background: Option<Color>,
    /// Hovered by at least one pointer
    pub hovered: bool,
    pub scroll_offset: Point,
    pub children: Vec<SceneNodeSnapshot>,
}

impl SceneNodeSnapshot {
    /// Depth-first search by element id
    pub fn find(&self, id: &str) -> Option<&SceneNodeSnapshot> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Number of nodes in this subtree, self included
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        let _ = write!(
            out,
            "{:indent$}{}",
            "",
            self.kind,
            indent = depth * 2
        );
        if let Some(id) = &self.id {
            let _ = write!(out, "#{id}");
        }
        let b = self.bounds;
        let _ = write!(
            out,
            " [{:.1}, {:.1}, {:.1}x{:.1}]",
            b.x(),
            b.y(),
            b.width(),
            b.height()
        );
        if self.hovered {
            out.push_str(" hovered");
        }
        if self.scroll_offset != Point::ZERO {
            let _ = write!(
                out,
                " scroll=({:.1}, {:.1})",
                self.scroll_offset.x, self.scroll_offset.y
            );
        }
        out.push('\n');
        for child in &self.children {
            child.write_tree(out, depth + 1);
        }
    }
}

/// Structural snapshot of a mounted tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub viewport: Viewport,
    pub root: Option<SceneNodeSnapshot>,
}

impl SceneSnapshot {
    pub fn find(&self, id: &str) -> Option<&SceneNodeSnapshot> {
        self.root.as_ref().and_then(|root| root.find(id))
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, |root| root.count())
    }

    /// Indented text rendering, one node per line
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        match &self.root {
            Some(root) => root.write_tree(&mut out, 0),
            None => out.push_str("(empty)\n"),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: Option<&str>, bounds: Rect, children: Vec<SceneNodeSnapshot>) -> SceneNodeSnapshot {
        SceneNodeSnapshot {
            id: id.map(str::to_string),
            kind: "div".into(),
            bounds,
            background: None,
            hovered: false,
            scroll_offset: Point::ZERO,
            children,
        }
    }

    #[test]
    fn test_dispatch_runs_deferred_handlers_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let order = Rc::new(RefCell::new(Vec::new()));
        let mut dispatch = Dispatch::new(true);
        for i in 0..3 {
            let order = Rc::clone(&order);
            dispatch.defer(move || {
                order.borrow_mut().push(i);
                2
            });
        }
        assert_eq!(dispatch.pending(), 3);
        assert!(order.borrow().is_empty());

        assert_eq!(dispatch.run(), DispatchOutcome { hit: true, handled: 6 });
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert_eq!(Dispatch::default().run(), DispatchOutcome::default());
    }

    #[test]
    fn test_find_and_count() {
        let snapshot = SceneSnapshot {
            viewport: Viewport::new(100.0, 100.0, 1.0),
            root: Some(node(
                None,
                Rect::new(0.0, 0.0, 100.0, 100.0),
                vec![node(Some("play"), Rect::new(10.0, 10.0, 20.0, 20.0), vec![])],
            )),
        };
        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(
            snapshot.find("play").map(|n| n.bounds),
            Some(Rect::new(10.0, 10.0, 20.0, 20.0))
        );
        assert!(snapshot.find("missing").is_none());
        assert_eq!(
            snapshot.render_tree(),
            "div [0.0, 0.0, 100.0x100.0]\n  div#play [10.0, 10.0, 20.0x20.0]\n"
        );
    }
}
