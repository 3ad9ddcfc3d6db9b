//! Xenon Texture Bridge
//!
//! Pushes completed UI frames into the texture a 3D scene samples from.
//!
//! The UI side calls [`TextureBridge::mark_needs_update`] whenever a frame
//! finishes; the 3D renderer calls [`TextureBridge::render`] from its own
//! render hook. Uploads only ever happen there, at most once per render,
//! and always carry the newest pixels.
//!
//! Two upload targets are provided:
//!
//! - [`WgpuTextureTarget`] - an `Rgba8UnormSrgb` GPU texture written with
//!   `Queue::write_texture`, optionally copied into an XR layer's target
//! - [`CpuTexture`] - a software texture for device-less hosts and tests
//!
//! # Example
//!
//! ```rust
//! use xenon_core::{PixelBuffer, UvConvention};
//! use xenon_gpu::{CpuTexture, TextureBridge};
//!
//! let frame = PixelBuffer::new(64, 64).unwrap();
//! let mut bridge = TextureBridge::new(UvConvention::BottomLeft);
//! let mut texture = CpuTexture::new();
//!
//! bridge.mark_needs_update();
//! assert!(bridge.render(&frame, &mut texture).unwrap());
//! assert!(!bridge.render(&frame, &mut texture).unwrap());
//! ```

mod bridge;
mod cpu;
mod error;
mod texture;

pub use bridge::{FrameView, TextureBridge, TextureUploader};
pub use cpu::CpuTexture;
pub use error::{GpuError, Result};
pub use texture::{request_headless_device, QueueUpload, WgpuTextureTarget, TEXTURE_FORMAT};
