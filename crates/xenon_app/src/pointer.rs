//! Pointer and wheel event bridge
//!
//! Converts hits on the displayed texture into synthetic events in the
//! UI's logical pixel space and remembers where each pointer last was.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use xenon_core::{
    client_to_pixel, Point, PointerButton, PointerInput, PointerKind, Rect, SceneRoot,
    UvConvention, WheelInput,
};
use xenon_platform::{DomPointerEvent, XrPointerEvent};

use crate::binding::RenderBinding;

#[derive(Debug, Default)]
struct PointerPositions {
    by_id: FxHashMap<u32, Point>,
    last_any: Option<Point>,
}

/// Injects synthetic pointer and wheel events into a binding's root
pub struct PointerBridge<R> {
    binding: RenderBinding<R>,
    positions: Rc<RefCell<PointerPositions>>,
}

impl<R> Clone for PointerBridge<R> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            positions: Rc::clone(&self.positions),
        }
    }
}

impl<R: SceneRoot + 'static> PointerBridge<R> {
    pub fn new(binding: RenderBinding<R>) -> Self {
        Self {
            binding,
            positions: Rc::default(),
        }
    }

    /// Last position reported for `pointer_id`
    pub fn last_position(&self, pointer_id: u32) -> Option<Point> {
        self.positions.borrow().by_id.get(&pointer_id).copied()
    }

    /// Most recent position of any pointer
    pub fn last_any_position(&self) -> Option<Point> {
        self.positions.borrow().last_any
    }

    /// Inject a pointer event at `(x, y)` in UI pixels
    ///
    /// `Leave` is delivered at the pointer's last known position. Returns
    /// false when no root is mounted.
    pub fn inject_event(
        &self,
        kind: PointerKind,
        x: f32,
        y: f32,
        button: PointerButton,
        pointer_id: u32,
    ) -> bool {
        if !self.binding.is_ready() {
            tracing::warn!(%kind, "pointer event injected before a root was mounted");
            return false;
        }

        let position = {
            let mut positions = self.positions.borrow_mut();
            match kind {
                PointerKind::Leave => positions
                    .by_id
                    .remove(&pointer_id)
                    .unwrap_or(Point::new(x, y)),
                _ => {
                    let position = Point::new(x, y);
                    positions.by_id.insert(pointer_id, position);
                    positions.last_any = Some(position);
                    position
                }
            }
        };

        let input = PointerInput::new(kind, position.x, position.y)
            .with_button(button)
            .with_pointer_id(pointer_id);
        tracing::trace!(%kind, x = position.x, y = position.y, pointer_id, "pointer injected");
        self.binding.dispatch_pointer(input).is_some()
    }

    /// Inject a wheel event at `(x, y)` with pixel deltas
    pub fn inject_wheel_event(&self, x: f32, y: f32, delta_x: f32, delta_y: f32) -> bool {
        if !self.binding.is_ready() {
            tracing::warn!("wheel event injected before a root was mounted");
            return false;
        }
        tracing::trace!(x, y, delta_x, delta_y, "wheel injected");
        self.binding
            .dispatch_wheel(WheelInput::new(x, y, delta_x, delta_y))
            .is_some()
    }

    /// Inject a controller ray hit on the textured quad
    ///
    /// Hits without texture coordinates are dropped, except `Leave`, which
    /// never needs a position.
    pub fn inject_uv(&self, kind: PointerKind, event: &XrPointerEvent, convention: UvConvention) -> bool {
        let pointer_id = event.pointer_id.unwrap_or(0);
        let button = PointerButton::from_index(event.button);
        let position = match (event.uv, kind) {
            (Some(uv), _) => convention.uv_to_pixel(uv, self.binding.viewport().size()),
            (None, PointerKind::Leave) => Point::ZERO,
            (None, _) => {
                tracing::trace!(%kind, "ray hit without uv dropped");
                return false;
            }
        };
        self.inject_event(kind, position.x, position.y, button, pointer_id)
    }

    /// Inject a pointer event over a flat image displayed at `display`
    pub fn inject_client(&self, kind: PointerKind, event: &DomPointerEvent, display: Rect) -> bool {
        let client = Point::new(event.client_x, event.client_y);
        let Some(position) = client_to_pixel(client, display, self.binding.viewport().size()) else {
            tracing::trace!(%kind, "pointer over zero-sized image dropped");
            return false;
        };
        self.inject_event(
            kind,
            position.x,
            position.y,
            PointerButton::from_index(event.button),
            event.pointer_id,
        )
    }
}
