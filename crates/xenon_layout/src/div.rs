//! Div builder with tailwind-style methods
//!
//! ```rust
//! use xenon_core::Color;
//! use xenon_layout::div;
//!
//! let ui = div()
//!     .flex_row()
//!     .gap(4.0)
//!     .p(2.0)
//!     .bg(Color::RED)
//!     .child(div().w(40.0).h(40.0).id("play"));
//! ```
//!
//! Spacing helpers take 4px units like Tailwind; `*_px` variants take pixels.

use taffy::{
    AlignItems, Dimension, Display, FlexDirection, JustifyContent, LengthPercentage, Overflow,
    Style,
};
use xenon_core::Color;

use crate::event_handler::{EventContext, EventHandlers, EventKind};

/// Paint properties of an element
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualStyle {
    pub background: Option<Color>,
    /// Replaces `background` while any pointer hovers the element
    pub hover_background: Option<Color>,
    pub border_width: f32,
    pub border_color: Option<Color>,
}

/// A div element builder
pub struct Div {
    pub(crate) style: Style,
    pub(crate) visual: VisualStyle,
    pub(crate) id: Option<String>,
    pub(crate) scroll: bool,
    pub(crate) handlers: EventHandlers,
    pub(crate) children: Vec<Div>,
}

/// Create a new div element
pub fn div() -> Div {
    Div::new()
}

impl Default for Div {
    fn default() -> Self {
        Self::new()
    }
}

impl Div {
    pub fn new() -> Self {
        Self {
            style: Style::default(),
            visual: VisualStyle::default(),
            id: None,
            scroll: false,
            handlers: EventHandlers::new(),
            children: Vec::new(),
        }
    }

    /// Element id, used by lookups and diagnostics
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    // =========================================================================
    // Display & Flex
    // =========================================================================

    pub fn flex_row(mut self) -> Self {
        self.style.display = Display::Flex;
        self.style.flex_direction = FlexDirection::Row;
        self
    }

    pub fn flex_col(mut self) -> Self {
        self.style.display = Display::Flex;
        self.style.flex_direction = FlexDirection::Column;
        self
    }

    /// Grow to fill remaining space
    pub fn flex_grow(mut self) -> Self {
        self.style.flex_grow = 1.0;
        self
    }

    /// Never shrink below the declared size
    pub fn flex_shrink_0(mut self) -> Self {
        self.style.flex_shrink = 0.0;
        self
    }

    pub fn items_center(mut self) -> Self {
        self.style.align_items = Some(AlignItems::Center);
        self
    }

    pub fn items_start(mut self) -> Self {
        self.style.align_items = Some(AlignItems::FlexStart);
        self
    }

    pub fn justify_center(mut self) -> Self {
        self.style.justify_content = Some(JustifyContent::Center);
        self
    }

    pub fn justify_between(mut self) -> Self {
        self.style.justify_content = Some(JustifyContent::SpaceBetween);
        self
    }

    // =========================================================================
    // Sizing
    // =========================================================================

    pub fn w(mut self, px: f32) -> Self {
        self.style.size.width = Dimension::Length(px);
        self
    }

    /// Set width to 100%
    pub fn w_full(mut self) -> Self {
        self.style.size.width = Dimension::Percent(1.0);
        self
    }

    pub fn h(mut self, px: f32) -> Self {
        self.style.size.height = Dimension::Length(px);
        self
    }

    /// Set height to 100%
    pub fn h_full(mut self) -> Self {
        self.style.size.height = Dimension::Percent(1.0);
        self
    }

    pub fn size(self, w: f32, h: f32) -> Self {
        self.w(w).h(h)
    }

    // =========================================================================
    // Spacing
    // =========================================================================

    /// Gap between children (in 4px units)
    pub fn gap(self, units: f32) -> Self {
        self.gap_px(units * 4.0)
    }

    pub fn gap_px(mut self, px: f32) -> Self {
        self.style.gap = taffy::Size {
            width: LengthPercentage::Length(px),
            height: LengthPercentage::Length(px),
        };
        self
    }

    /// Padding on all sides (in 4px units)
    pub fn p(self, units: f32) -> Self {
        self.p_px(units * 4.0)
    }

    pub fn p_px(mut self, px: f32) -> Self {
        let val = LengthPercentage::Length(px);
        self.style.padding = taffy::Rect {
            left: val,
            right: val,
            top: val,
            bottom: val,
        };
        self
    }

    // =========================================================================
    // Visuals
    // =========================================================================

    pub fn bg(mut self, color: Color) -> Self {
        self.visual.background = Some(color);
        self
    }

    pub fn hover_bg(mut self, color: Color) -> Self {
        self.visual.hover_background = Some(color);
        self
    }

    /// Border drawn inside the element's bounds
    pub fn border(mut self, width: f32, color: Color) -> Self {
        let val = LengthPercentage::Length(width);
        self.style.border = taffy::Rect {
            left: val,
            right: val,
            top: val,
            bottom: val,
        };
        self.visual.border_width = width;
        self.visual.border_color = Some(color);
        self
    }

    /// Make this element a scroll container
    ///
    /// Children are clipped to its bounds and wheel input moves them.
    pub fn scroll(mut self) -> Self {
        self.scroll = true;
        self.style.overflow = taffy::Point {
            x: Overflow::Scroll,
            y: Overflow::Scroll,
        };
        self.style.scrollbar_width = 0.0;
        self
    }

    // =========================================================================
    // Children
    // =========================================================================

    pub fn child(mut self, child: Div) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Div>) -> Self {
        self.children.extend(children);
        self
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::Click, handler);
        self
    }

    pub fn on_pointer_down<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::PointerDown, handler);
        self
    }

    pub fn on_pointer_up<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::PointerUp, handler);
        self
    }

    pub fn on_pointer_move<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::PointerMove, handler);
        self
    }

    pub fn on_hover_enter<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::HoverEnter, handler);
        self
    }

    pub fn on_hover_leave<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::HoverLeave, handler);
        self
    }

    /// Fired on the wheel target and its ancestors after any scrolling
    pub fn on_scroll<F>(mut self, handler: F) -> Self
    where
        F: Fn(&EventContext) + 'static,
    {
        self.handlers.on(EventKind::Scroll, handler);
        self
    }

    pub(crate) fn kind(&self) -> &'static str {
        if self.scroll {
            "scroll"
        } else {
            "div"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_style() {
        let d = div().w(40.0).h(20.0).p(1.0).gap(2.0).flex_col();
        assert_eq!(d.style.size.width, Dimension::Length(40.0));
        assert_eq!(d.style.padding.left, LengthPercentage::Length(4.0));
        assert_eq!(d.style.gap.height, LengthPercentage::Length(8.0));
        assert_eq!(d.style.flex_direction, FlexDirection::Column);
    }

    #[test]
    fn test_scroll_container_kind() {
        let d = div().scroll().child(div()).child(div());
        assert_eq!(d.kind(), "scroll");
        assert_eq!(d.children.len(), 2);
        assert_eq!(d.style.overflow.y, Overflow::Scroll);
    }
}
