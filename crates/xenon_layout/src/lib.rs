//! Xenon Layout
//!
//! A small retained-mode UI toolkit used as the default off-screen tree for
//! Xenon: flexbox layout powered by Taffy, a software painter writing into a
//! [`xenon_core::PixelBuffer`], and pointer routing with hover, press, click
//! and wheel scrolling.
//!
//! # Example
//!
//! ```rust
//! use xenon_core::{Color, PixelBuffer, SceneRoot, Viewport};
//! use xenon_layout::prelude::*;
//!
//! let ui = div()
//!     .flex_col()
//!     .gap(2.0)
//!     .p(4.0)
//!     .bg(Color::from_hex(0x202020))
//!     .child(div().id("play").h(48.0).bg(Color::BLUE).hover_bg(Color::RED))
//!     .child(div().id("list").scroll().flex_grow());
//!
//! let viewport = Viewport::new(256.0, 256.0, 1.0);
//! let mut tree = RenderTree::from_element(ui, viewport).unwrap();
//! let (w, h) = viewport.physical_size();
//! let mut frame = PixelBuffer::new(w, h).unwrap();
//! tree.flush_frame(&mut frame).unwrap();
//! assert!(!frame.is_blank());
//! ```

pub mod div;
pub mod error;
pub mod event_handler;
pub mod event_router;
pub mod renderer;
pub mod tree;

pub use div::{div, Div, VisualStyle};
pub use error::{LayoutError, Result};
pub use event_handler::{EventCallback, EventContext, EventHandlers, EventKind};
pub use event_router::{EventRouter, HitTestResult, RoutedEvent};
pub use renderer::{DrawCommand, RenderTree};
pub use tree::{LayoutNodeId, LayoutTree};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::div::{div, Div};
    pub use crate::event_handler::{EventContext, EventKind};
    pub use crate::renderer::RenderTree;
}
