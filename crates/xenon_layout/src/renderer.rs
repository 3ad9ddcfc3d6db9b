//! RenderTree bridge connecting layout, paint and input
//!
//! A mounted [`Div`] hierarchy becomes a [`RenderTree`]: one Taffy node per
//! element plus the paint state and handlers keyed by [`LayoutNodeId`].
//! Frames are produced in three steps:
//!
//! 1. layout against the viewport's logical size
//! 2. paint into a flat display list (logical pixels, with clip rects)
//! 3. composite the list source-over into the target, scaled by the pixel ratio

use rustc_hash::FxHashMap;
use slotmap::SecondaryMap;
use smallvec::SmallVec;
use taffy::{AvailableSpace, Dimension};
use xenon_core::{
    Color, DirtyFlag, Dispatch, FlushError, FrameStats, PixelBuffer, Point, PointerInput,
    PointerKind, Rect, Rgba8, SceneNodeSnapshot, SceneRoot, SceneSnapshot, Vec2, Viewport,
    WheelInput,
};

use crate::div::{Div, VisualStyle};
use crate::error::{LayoutError, Result};
use crate::event_handler::{EventCallback, EventContext, EventHandlers, EventKind};
use crate::event_router::{node_bounds, EventRouter, RoutedEvent};
use crate::tree::{LayoutNodeId, LayoutTree};

/// Per-element render state
struct RenderNode {
    kind: &'static str,
    id: Option<String>,
    parent: Option<LayoutNodeId>,
    visual: VisualStyle,
    scroll: bool,
    scroll_offset: Point,
    handlers: EventHandlers,
}

/// One solid fill in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub rect: Rect,
    /// Clip from the nearest enclosing scroll containers
    pub clip: Option<Rect>,
    pub color: Color,
}

/// A UI tree the bridge can drive
pub struct RenderTree {
    layout: LayoutTree,
    nodes: SecondaryMap<LayoutNodeId, RenderNode>,
    ids: FxHashMap<String, LayoutNodeId>,
    root: Option<LayoutNodeId>,
    viewport: Viewport,
    router: EventRouter,
    dirty: DirtyFlag,
    layout_valid: bool,
}

impl RenderTree {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            layout: LayoutTree::new(),
            nodes: SecondaryMap::new(),
            ids: FxHashMap::default(),
            root: None,
            viewport,
            router: EventRouter::new(),
            dirty: DirtyFlag::new(true),
            layout_valid: false,
        }
    }

    /// Build a tree from an element hierarchy
    pub fn from_element(element: Div, viewport: Viewport) -> Result<Self> {
        let mut tree = Self::new(viewport);
        tree.mount(element)?;
        Ok(tree)
    }

    /// Replace the current content with `element`
    ///
    /// The root is stretched to the viewport's logical size.
    pub fn mount(&mut self, element: Div) -> Result<LayoutNodeId> {
        self.unmount();
        let root = match self.build(element, None) {
            Ok(root) => root,
            Err(err) => {
                self.unmount();
                return Err(err);
            }
        };
        self.root = Some(root);
        self.fit_root_to_viewport();
        tracing::debug!(nodes = self.layout.len(), "ui tree mounted");
        Ok(root)
    }

    /// Drop all content
    pub fn unmount(&mut self) {
        self.layout.clear();
        self.nodes.clear();
        self.ids.clear();
        self.root = None;
        self.router.reset();
        self.layout_valid = false;
        self.dirty.mark();
    }

    fn build(&mut self, element: Div, parent: Option<LayoutNodeId>) -> Result<LayoutNodeId> {
        let kind = element.kind();
        let Div {
            style,
            visual,
            id,
            scroll,
            handlers,
            children,
        } = element;

        let node = self.layout.create_node(style)?;
        if let Some(id) = &id {
            if self.ids.insert(id.clone(), node).is_some() {
                return Err(LayoutError::DuplicateId(id.clone()));
            }
        }
        self.nodes.insert(
            node,
            RenderNode {
                kind,
                id,
                parent,
                visual,
                scroll,
                scroll_offset: Point::ZERO,
                handlers,
            },
        );
        if let Some(parent) = parent {
            self.layout.add_child(parent, node)?;
        }

        for child in children {
            self.build(child, Some(node))?;
        }
        Ok(node)
    }

    fn fit_root_to_viewport(&mut self) {
        let Some(root) = self.root else {
            return;
        };
        if let Some(mut style) = self.layout.style(root).cloned() {
            style.size = taffy::Size {
                width: Dimension::Length(self.viewport.width),
                height: Dimension::Length(self.viewport.height),
            };
            self.layout.set_style(root, style);
        }
        self.layout_valid = false;
    }

    pub fn root(&self) -> Option<LayoutNodeId> {
        self.root
    }

    pub fn layout(&self) -> &LayoutTree {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of mounted elements
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Look up an element by the id given to [`Div::id`]
    pub fn node_by_id(&self, id: &str) -> Option<LayoutNodeId> {
        self.ids.get(id).copied()
    }

    /// Compute layout if anything invalidated it
    pub fn compute_layout(&mut self) -> Result<()> {
        if self.layout_valid {
            return Ok(());
        }
        if let Some(root) = self.root {
            let available = taffy::Size {
                width: AvailableSpace::Definite(self.viewport.width),
                height: AvailableSpace::Definite(self.viewport.height),
            };
            self.layout.compute_layout(root, available)?;
        }
        self.layout_valid = true;
        Ok(())
    }

    /// Absolute bounds in logical pixels, scroll offsets applied
    pub fn absolute_bounds(&self, node: LayoutNodeId) -> Option<Rect> {
        let mut chain = smallvec::SmallVec::<[LayoutNodeId; 8]>::new();
        let mut current = Some(node);
        while let Some(n) = current {
            chain.push(n);
            current = self.nodes.get(n)?.parent;
        }

        let mut origin = Point::ZERO;
        let mut bounds = None;
        for &n in chain.iter().rev() {
            let b = node_bounds(self, n, origin)?;
            let scroll = self.scroll_offset(n);
            origin = Point::new(b.x() - scroll.x, b.y() - scroll.y);
            bounds = Some(b);
        }
        bounds
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Change an element's background, returns false for unknown ids
    pub fn set_background(&mut self, id: &str, color: Color) -> bool {
        let Some(node) = self.node_by_id(id) else {
            return false;
        };
        match self.nodes.get_mut(node) {
            Some(render_node) if render_node.visual.background != Some(color) => {
                render_node.visual.background = Some(color);
                self.dirty.mark();
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn background(&self, id: &str) -> Option<Color> {
        let node = self.node_by_id(id)?;
        self.nodes.get(node)?.visual.background
    }

    /// True when any pointer hovers the element
    pub fn is_hovered(&self, id: &str) -> bool {
        self.node_by_id(id)
            .is_some_and(|node| self.router.is_hovered(node))
    }

    pub fn scroll_offset(&self, node: LayoutNodeId) -> Point {
        self.nodes
            .get(node)
            .map_or(Point::ZERO, |n| n.scroll_offset)
    }

    /// Largest offset the content of a scroll container can move
    pub fn max_scroll(&self, node: LayoutNodeId) -> Point {
        let Some(layout) = self.layout.get_layout(node) else {
            return Point::ZERO;
        };
        let (content_w, content_h) = (layout.content_size.width, layout.content_size.height);
        Point::new(
            (content_w - layout.size.width).max(0.0),
            (content_h - layout.size.height).max(0.0),
        )
    }

    /// Move a scroll container's content, clamped to its bounds
    ///
    /// Returns true when the offset changed.
    pub fn scroll_by(&mut self, node: LayoutNodeId, delta_x: f32, delta_y: f32) -> bool {
        let max = self.max_scroll(node);
        let Some(render_node) = self.nodes.get_mut(node) else {
            return false;
        };
        if !render_node.scroll {
            return false;
        }

        let old = render_node.scroll_offset;
        let new = Point::new(
            (old.x + delta_x).clamp(0.0, max.x),
            (old.y + delta_y).clamp(0.0, max.y),
        );
        if new == old {
            return false;
        }
        render_node.scroll_offset = new;
        tracing::trace!(?node, x = new.x, y = new.y, "scroll offset changed");
        self.dirty.mark();
        true
    }

    // =========================================================================
    // Paint & Composite
    // =========================================================================

    /// Paint into a display list in back-to-front order
    pub fn paint(&self) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        if let Some(root) = self.root {
            self.paint_node(root, Point::ZERO, None, &mut commands);
        }
        commands
    }

    fn paint_node(
        &self,
        node: LayoutNodeId,
        parent_origin: Point,
        clip: Option<Rect>,
        out: &mut Vec<DrawCommand>,
    ) {
        let (Some(render_node), Some(bounds)) =
            (self.nodes.get(node), node_bounds(self, node, parent_origin))
        else {
            return;
        };
        let visual = &render_node.visual;

        let fill = match visual.hover_background {
            Some(hover) if self.router.is_hovered(node) => Some(hover),
            _ => visual.background,
        };
        if let Some(color) = fill {
            out.push(DrawCommand {
                rect: bounds,
                clip,
                color,
            });
        }

        if let (Some(color), w) = (visual.border_color, visual.border_width) {
            if w > 0.0 {
                let (x, y, bw, bh) = (bounds.x(), bounds.y(), bounds.width(), bounds.height());
                for rect in [
                    Rect::new(x, y, bw, w),
                    Rect::new(x, y + bh - w, bw, w),
                    Rect::new(x, y + w, w, bh - 2.0 * w),
                    Rect::new(x + bw - w, y + w, w, bh - 2.0 * w),
                ] {
                    out.push(DrawCommand { rect, clip, color });
                }
            }
        }

        let child_clip = if render_node.scroll {
            match clip {
                Some(outer) => match outer.intersect(&bounds) {
                    Some(inner) => Some(inner),
                    None => return,
                },
                None => Some(bounds),
            }
        } else {
            clip
        };
        let scroll = render_node.scroll_offset;
        let child_origin = Point::new(bounds.x() - scroll.x, bounds.y() - scroll.y);
        for child in self.layout.children(node) {
            self.paint_node(child, child_origin, child_clip, out);
        }
    }

    /// Blend a display list into `target`, scaled by the viewport pixel ratio
    pub fn composite(&self, commands: &[DrawCommand], target: &mut PixelBuffer) {
        target.clear(Rgba8::TRANSPARENT);
        let dpr = self.viewport.dpr;
        for command in commands {
            let visible = match command.clip {
                Some(clip) => match command.rect.intersect(&clip) {
                    Some(rect) => rect,
                    None => continue,
                },
                None => command.rect,
            };
            let r = visible.scale(dpr);
            target.blend_rect(
                r.x().round() as i64,
                r.y().round() as i64,
                r.right().round() as i64,
                r.bottom().round() as i64,
                command.color,
            );
        }
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Queue the handlers along each event's path
    ///
    /// Contexts are built now, against the current layout; propagation
    /// stops are honoured when the queued chain runs.
    fn collect_handlers(&self, events: &[RoutedEvent], dispatch: &mut Dispatch) {
        for event in events {
            let mut chain: SmallVec<[(SmallVec<[EventCallback; 1]>, EventContext); 4]> = SmallVec::new();
            for &node in &event.path {
                let Some(render_node) = self.nodes.get(node) else {
                    continue;
                };
                let callbacks = render_node.handlers.callbacks(event.kind);
                if callbacks.is_empty() {
                    continue;
                }

                let origin = self.absolute_bounds(node).map_or(Point::ZERO, |b| b.origin);
                let mut ctx = EventContext::new(event.kind, node);
                ctx.target = event.target;
                ctx.pointer_id = event.pointer_id;
                ctx.button = event.button;
                ctx.position = event.position;
                ctx.local = Point::new(event.position.x - origin.x, event.position.y - origin.y);
                ctx.scroll_delta = event.scroll_delta;
                chain.push((callbacks, ctx));
            }
            if chain.is_empty() {
                continue;
            }

            dispatch.defer(move || {
                let mut handled = 0;
                for (callbacks, ctx) in &chain {
                    for callback in callbacks {
                        callback(ctx);
                    }
                    handled += callbacks.len();
                    if ctx.is_propagation_stopped() {
                        break;
                    }
                }
                handled
            });
        }
    }

    fn ensure_layout(&mut self) -> bool {
        match self.compute_layout() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("layout failed, dropping input: {err}");
                false
            }
        }
    }

    fn snapshot_node(&self, node: LayoutNodeId) -> Option<SceneNodeSnapshot> {
        let render_node = self.nodes.get(node)?;
        Some(SceneNodeSnapshot {
            id: render_node.id.clone(),
            kind: render_node.kind.to_string(),
            bounds: self.absolute_bounds(node).unwrap_or(Rect::ZERO),
            background: render_node.visual.background,
            hovered: self.router.is_hovered(node),
            scroll_offset: render_node.scroll_offset,
            children: self
                .layout
                .children(node)
                .into_iter()
                .filter_map(|child| self.snapshot_node(child))
                .collect(),
        })
    }
}

impl Default for RenderTree {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl SceneRoot for RenderTree {
    fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.fit_root_to_viewport();
        self.dirty.mark();
    }

    fn dirty_flag(&self) -> DirtyFlag {
        self.dirty.clone()
    }

    fn flush_frame(&mut self, target: &mut PixelBuffer) -> std::result::Result<FrameStats, FlushError> {
        let (expected_width, expected_height) = self.viewport.physical_size();
        if (target.width(), target.height()) != (expected_width, expected_height) {
            return Err(FlushError::TargetMismatch {
                expected_width,
                expected_height,
                actual_width: target.width(),
                actual_height: target.height(),
            });
        }

        self.compute_layout()
            .map_err(|err| FlushError::Layout(err.to_string()))?;
        let commands = self.paint();
        self.composite(&commands, target);

        let stats = FrameStats {
            nodes: self.layout.len(),
            draw_commands: commands.len(),
        };
        tracing::trace!(nodes = stats.nodes, commands = stats.draw_commands, "frame flushed");
        Ok(stats)
    }

    fn dispatch_pointer(&mut self, input: PointerInput) -> Dispatch {
        if !self.ensure_layout() {
            return Dispatch::default();
        }

        let mut router = std::mem::take(&mut self.router);
        let events = match input.kind {
            PointerKind::Move => router.on_pointer_move(self, input.pointer_id, input.position),
            PointerKind::Down => {
                router.on_pointer_down(self, input.pointer_id, input.position, input.button)
            }
            PointerKind::Up => router.on_pointer_up(self, input.pointer_id, input.position, input.button),
            PointerKind::Leave => router.on_pointer_leave(input.pointer_id, input.position),
        };
        self.router = router;

        let mut hit = false;
        for event in &events {
            match event.kind {
                EventKind::HoverEnter | EventKind::HoverLeave => {
                    let hover_styled = self
                        .nodes
                        .get(event.target)
                        .is_some_and(|n| n.visual.hover_background.is_some());
                    if hover_styled {
                        self.dirty.mark();
                    }
                }
                EventKind::PointerMove | EventKind::PointerDown | EventKind::PointerUp => hit = true,
                EventKind::Click | EventKind::Scroll => {}
            }
        }

        let mut dispatch = Dispatch::new(hit);
        self.collect_handlers(&events, &mut dispatch);
        dispatch
    }

    fn dispatch_wheel(&mut self, input: WheelInput) -> Dispatch {
        if !self.ensure_layout() {
            return Dispatch::default();
        }
        let Some(hit) = self.router.hit_test(self, input.position) else {
            return Dispatch::default();
        };

        // Nearest scroll container that can still move takes the delta
        for &node in hit.ancestors.iter().rev() {
            if self.scroll_by(node, input.delta_x, input.delta_y) {
                break;
            }
        }

        let event = RoutedEvent {
            kind: EventKind::Scroll,
            target: hit.node,
            path: hit.ancestors.iter().rev().copied().collect(),
            pointer_id: 0,
            button: xenon_core::PointerButton::Primary,
            position: input.position,
            scroll_delta: Vec2::new(input.delta_x, input.delta_y),
        };
        let mut dispatch = Dispatch::new(true);
        self.collect_handlers(std::slice::from_ref(&event), &mut dispatch);
        dispatch
    }

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            viewport: self.viewport,
            root: self.root.and_then(|root| self.snapshot_node(root)),
        }
    }
}
