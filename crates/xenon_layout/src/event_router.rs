//! Event routing from synthetic pointer input to layout elements
//!
//! ```text
//! PointerInput / WheelInput (tree space)
//!     ↓
//! EventRouter (hit testing, per-pointer hover and press tracking)
//!     ↓
//! RoutedEvent (HoverEnter, PointerDown, Click, ...)
//!     ↓
//! RenderTree dispatches to element handlers
//! ```
//!
//! Every pointer id is tracked separately, so two controllers can hover
//! and press different elements at the same time.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use xenon_core::{Point, PointerButton, Rect, Vec2};

use crate::event_handler::EventKind;
use crate::renderer::RenderTree;
use crate::tree::LayoutNodeId;

pub type NodePath = SmallVec<[LayoutNodeId; 8]>;

/// Result of a hit test
#[derive(Clone, Debug)]
pub struct HitTestResult {
    /// The node that was hit (topmost in z-order)
    pub node: LayoutNodeId,
    /// Position relative to the node's bounds
    pub local: Point,
    /// The hit chain from root to the hit node, inclusive
    pub ancestors: NodePath,
}

/// An element-level event produced by the router
#[derive(Clone, Debug)]
pub struct RoutedEvent {
    pub kind: EventKind,
    pub target: LayoutNodeId,
    /// Nodes to notify in order: target first, then ancestors when bubbling
    pub path: NodePath,
    pub pointer_id: u32,
    pub button: PointerButton,
    pub position: Point,
    pub scroll_delta: Vec2,
}

impl RoutedEvent {
    fn new(kind: EventKind, path: NodePath, pointer_id: u32, position: Point) -> Option<Self> {
        let target = *path.first()?;
        Some(Self {
            kind,
            target,
            path,
            pointer_id,
            button: PointerButton::Primary,
            position,
            scroll_delta: Vec2::ZERO,
        })
    }

    fn single(kind: EventKind, node: LayoutNodeId, pointer_id: u32, position: Point) -> Self {
        Self {
            kind,
            target: node,
            path: smallvec::smallvec![node],
            pointer_id,
            button: PointerButton::Primary,
            position,
            scroll_delta: Vec2::ZERO,
        }
    }
}

pub type RoutedEvents = SmallVec<[RoutedEvent; 8]>;

#[derive(Clone, Debug, Default)]
struct PointerState {
    position: Point,
    /// Hovered chain, root to leaf
    hovered: NodePath,
    pressed: Option<LayoutNodeId>,
}

/// Routes pointer input to layout elements
#[derive(Default)]
pub struct EventRouter {
    pointers: FxHashMap<u32, PointerState>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when any pointer hovers `node`
    pub fn is_hovered(&self, node: LayoutNodeId) -> bool {
        self.pointers.values().any(|p| p.hovered.contains(&node))
    }

    /// Last known position of a pointer
    pub fn pointer_position(&self, pointer_id: u32) -> Option<Point> {
        self.pointers.get(&pointer_id).map(|p| p.position)
    }

    /// Forget all pointer state, e.g. after the tree was rebuilt
    pub fn reset(&mut self) {
        self.pointers.clear();
    }

    // =========================================================================
    // Pointer Events
    // =========================================================================

    /// Handle pointer movement
    ///
    /// Emits HoverLeave (leaf first), HoverEnter (root first), then a
    /// bubbling PointerMove from the topmost hit.
    pub fn on_pointer_move(&mut self, tree: &RenderTree, pointer_id: u32, position: Point) -> RoutedEvents {
        let hit = self.hit_test(tree, position);
        let mut events = self.update_hover(pointer_id, position, hit.as_ref());
        if let Some(hit) = hit {
            events.extend(RoutedEvent::new(
                EventKind::PointerMove,
                bubble_path(&hit.ancestors),
                pointer_id,
                position,
            ));
        }
        events
    }

    /// Handle pointer press
    ///
    /// The topmost hit becomes this pointer's pressed target.
    pub fn on_pointer_down(
        &mut self,
        tree: &RenderTree,
        pointer_id: u32,
        position: Point,
        button: PointerButton,
    ) -> RoutedEvents {
        let hit = self.hit_test(tree, position);
        let mut events = self.update_hover(pointer_id, position, hit.as_ref());
        let pressed = hit.as_ref().map(|h| h.node);
        if let Some(state) = self.pointers.get_mut(&pointer_id) {
            state.pressed = pressed;
        }
        if let Some(hit) = hit {
            events.extend(
                RoutedEvent::new(EventKind::PointerDown, bubble_path(&hit.ancestors), pointer_id, position)
                    .map(|e| RoutedEvent { button, ..e }),
            );
        }
        events
    }

    /// Handle pointer release
    ///
    /// Emits PointerUp at the topmost hit, then Click on the pressed target
    /// when the release landed on it or one of its descendants.
    pub fn on_pointer_up(
        &mut self,
        tree: &RenderTree,
        pointer_id: u32,
        position: Point,
        button: PointerButton,
    ) -> RoutedEvents {
        let hit = self.hit_test(tree, position);
        let mut events = self.update_hover(pointer_id, position, hit.as_ref());
        let pressed = self
            .pointers
            .get_mut(&pointer_id)
            .and_then(|state| state.pressed.take());

        let Some(hit) = hit else {
            return events;
        };
        events.extend(
            RoutedEvent::new(EventKind::PointerUp, bubble_path(&hit.ancestors), pointer_id, position)
                .map(|e| RoutedEvent { button, ..e }),
        );

        if let Some(pressed) = pressed {
            if let Some(depth) = hit.ancestors.iter().position(|&n| n == pressed) {
                events.extend(
                    RoutedEvent::new(
                        EventKind::Click,
                        bubble_path(&hit.ancestors[..=depth]),
                        pointer_id,
                        position,
                    )
                    .map(|e| RoutedEvent { button, ..e }),
                );
            }
        }
        events
    }

    /// Handle a pointer leaving the surface
    ///
    /// Emits HoverLeave to everything the pointer hovered and drops any
    /// press in progress.
    pub fn on_pointer_leave(&mut self, pointer_id: u32, position: Point) -> RoutedEvents {
        let Some(state) = self.pointers.remove(&pointer_id) else {
            return RoutedEvents::new();
        };
        state
            .hovered
            .iter()
            .rev()
            .map(|&node| RoutedEvent::single(EventKind::HoverLeave, node, pointer_id, position))
            .collect()
    }

    fn update_hover(&mut self, pointer_id: u32, position: Point, hit: Option<&HitTestResult>) -> RoutedEvents {
        let state = self.pointers.entry(pointer_id).or_default();
        state.position = position;

        let current: NodePath = hit.map(|h| h.ancestors.clone()).unwrap_or_default();
        let mut events = RoutedEvents::new();

        for &node in state.hovered.iter().rev() {
            if !current.contains(&node) {
                events.push(RoutedEvent::single(EventKind::HoverLeave, node, pointer_id, position));
            }
        }
        for &node in &current {
            if !state.hovered.contains(&node) {
                events.push(RoutedEvent::single(EventKind::HoverEnter, node, pointer_id, position));
            }
        }

        state.hovered = current;
        events
    }

    // =========================================================================
    // Hit Testing
    // =========================================================================

    /// Hit test to find the topmost element at a point
    ///
    /// Later children paint over earlier ones, so they are tested first.
    pub fn hit_test(&self, tree: &RenderTree, position: Point) -> Option<HitTestResult> {
        let root = tree.root()?;
        self.hit_test_node(tree, root, position, Point::ZERO, NodePath::new())
    }

    fn hit_test_node(
        &self,
        tree: &RenderTree,
        node: LayoutNodeId,
        position: Point,
        parent_origin: Point,
        mut ancestors: NodePath,
    ) -> Option<HitTestResult> {
        let bounds = node_bounds(tree, node, parent_origin)?;
        if !bounds.contains(position) {
            return None;
        }

        ancestors.push(node);

        let scroll = tree.scroll_offset(node);
        let child_origin = Point::new(bounds.x() - scroll.x, bounds.y() - scroll.y);
        for child in tree.layout().children(node).into_iter().rev() {
            if let Some(result) =
                self.hit_test_node(tree, child, position, child_origin, ancestors.clone())
            {
                return Some(result);
            }
        }

        Some(HitTestResult {
            node,
            local: Point::new(position.x - bounds.x(), position.y - bounds.y()),
            ancestors,
        })
    }
}

/// Bounds of `node` given its parent's content origin
pub(crate) fn node_bounds(tree: &RenderTree, node: LayoutNodeId, parent_origin: Point) -> Option<Rect> {
    let layout = tree.layout().get_layout(node)?;
    Some(Rect::new(
        parent_origin.x + layout.location.x,
        parent_origin.y + layout.location.y,
        layout.size.width,
        layout.size.height,
    ))
}

/// Root-to-leaf chain reversed into bubbling order
fn bubble_path(ancestors: &[LayoutNodeId]) -> NodePath {
    ancestors.iter().rev().copied().collect()
}
