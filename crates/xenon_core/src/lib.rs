//! Xenon Core
//!
//! Foundational types shared by every Xenon crate:
//!
//! - **Geometry**: points, sizes, rects and colors in logical UI space
//! - **Pixel surfaces**: the RGBA8 [`PixelBuffer`] a UI tree paints into
//! - **Dirty tracking**: the shared [`DirtyFlag`] a UI tree raises on change
//! - **Coordinates**: UV ↔ pixel mapping for textured quads ([`UvConvention`])
//! - **Input**: synthetic pointer and wheel events injected into a UI tree
//! - **Scene contract**: the narrow [`SceneRoot`] interface a UI toolkit
//!   exposes to the frame bridge
//!
//! # Example
//!
//! ```rust
//! use xenon_core::{Size, UvConvention, Vec2};
//!
//! let size = Size::new(512.0, 512.0);
//! let p = UvConvention::BottomLeft.uv_to_pixel(Vec2::new(0.5, 0.25), size);
//! assert_eq!((p.x, p.y), (256.0, 384.0));
//! ```

pub mod coords;
pub mod dirty;
pub mod error;
pub mod geometry;
pub mod input;
pub mod scene;
pub mod surface;

pub use coords::{client_to_pixel, UvConvention};
pub use dirty::DirtyFlag;
pub use error::{FlushError, SurfaceError};
pub use geometry::{Color, Point, Rect, Size, Vec2};
pub use input::{PointerButton, PointerInput, PointerKind, WheelInput};
pub use scene::{
    Dispatch, DispatchOutcome, FrameStats, PendingHandler, SceneNodeSnapshot, SceneRoot,
    SceneSnapshot,
};
pub use surface::{PixelBuffer, Rgba8, Viewport};
