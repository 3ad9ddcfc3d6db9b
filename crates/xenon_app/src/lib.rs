//! Xenon
//!
//! Renders an off-screen 2D UI into a texture inside an XR scene and feeds
//! controller input back into it.
//!
//! The pieces, bottom-up:
//!
//! - [`OffscreenSurface`] - the pixel buffer a UI root paints into
//! - [`RenderBinding`] - ties a root to its surface and flushes it on frame
//!   ticks when the root's dirty flag is raised
//! - [`PointerBridge`] - maps ray hits and flat-image clicks to UI pixels
//!   and injects them as pointer and wheel events
//! - [`JoystickScroll`] - turns thumbstick deflection into wheel events
//! - [`Xenon`] - the XR-hosted composition of all of the above, ticked by
//!   an [`XrFrameDriver`](xenon_platform::XrFrameDriver)
//! - [`XenonImage`] - the same UI shown as a PNG outside XR, ticked by a
//!   [`FreeRunningDriver`](xenon_platform::FreeRunningDriver)
//!
//! # Example
//!
//! ```rust
//! use xenon_app::prelude::*;
//! use xenon_core::Color;
//! use xenon_gpu::CpuTexture;
//!
//! let driver = XrFrameDriver::new();
//! let config = XenonConfig::default().with_size(256, 128).with_dpr(1.0);
//! let xenon = Xenon::new(config, &driver).unwrap();
//!
//! xenon
//!     .mount(
//!         div()
//!             .flex_col()
//!             .bg(Color::from_hex(0x101018))
//!             .child(div().id("play").h(48.0).bg(Color::BLUE).on_click(|_| {})),
//!     )
//!     .unwrap();
//!
//! // XR frame loop
//! driver.execute_frame(0.0).unwrap();
//! let mut texture = CpuTexture::new();
//! assert!(xenon.render_layer(&mut texture).unwrap());
//!
//! // Controller ray hit near the top-left corner of the quad
//! assert!(xenon.on_pointer_move(&XrPointerEvent::at(0.1, 0.9)));
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod frame_clock;
pub mod image_view;
pub mod joystick;
pub mod pointer;
pub mod registry;
pub mod surface;
pub mod xenon;

pub use binding::{FrameEnd, FrameEndKey, RenderBinding, WeakBinding};
pub use config::XenonConfig;
pub use error::{Result, XenonError};
pub use frame_clock::FrameClock;
pub use image_view::{encode_png, EncodedFrame, XenonImage};
pub use joystick::{JoystickScroll, DEADZONE};
pub use pointer::PointerBridge;
pub use registry::{RegistryKey, RootDiagnostics, RootSnapshot, XenonRegistry};
pub use surface::OffscreenSurface;
pub use xenon::Xenon;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::XenonConfig;
    pub use crate::error::{Result, XenonError};
    pub use crate::frame_clock::FrameClock;
    pub use crate::image_view::XenonImage;
    pub use crate::registry::XenonRegistry;
    pub use crate::xenon::Xenon;

    pub use xenon_layout::prelude::*;
    pub use xenon_platform::{
        FrameDriver, FreeRunningDriver, SharedInputSources, XrFrameDriver, XrPointerEvent,
    };
}
