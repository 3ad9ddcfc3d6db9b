//! Xenon Platform Layer
//!
//! Abstracts "when do we get a chance to draw" and the XR input surface.
//!
//! # Frame drivers
//!
//! Two [`FrameDriver`] implementations exist and a given UI tree is driven
//! by exactly one of them:
//!
//! - [`FreeRunningDriver`] - tied to the host display's refresh callback
//!   through a [`DisplayLink`]. Frames are requested on demand with
//!   `schedule_frame` and stop once no work is pending.
//! - [`XrFrameDriver`] - never self-schedules. The embedding 3D render loop
//!   calls [`XrFrameDriver::execute_frame`] once per XR frame, because the
//!   display callback is throttled or suspended while an XR session owns
//!   rendering.
//!
//! Callbacks run synchronously, in registration order, against a snapshot
//! of the registry taken at the start of the tick.
//!
//! # Example
//!
//! ```rust
//! use xenon_platform::{FrameDriver, XrFrameDriver};
//!
//! let driver = XrFrameDriver::new();
//! let sub = driver.subscribe(|time| {
//!     assert!(time.timestamp_ms >= 0.0);
//!     Ok(())
//! });
//!
//! // Called from the XR session's frame loop
//! driver.execute_frame(16.6).unwrap();
//! sub.unsubscribe();
//! ```

mod driver;
mod error;
mod frame;
mod xr;

pub use driver::{DisplayLink, DriverKind, FrameDriver, FreeRunningDriver, XrFrameDriver};
pub use error::{PlatformError, Result};
pub use frame::{CallbackId, FrameCallback, FrameSubscription, FrameTime};
pub use xr::{
    DomPointerEvent, Gamepad, GamepadButton, Handedness, InputSourceProvider, InputSources,
    SharedInputSources, XrInputSource, XrPointerEvent,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::driver::{DisplayLink, DriverKind, FrameDriver, FreeRunningDriver, XrFrameDriver};
    pub use crate::error::{PlatformError, Result};
    pub use crate::frame::{FrameSubscription, FrameTime};
    pub use crate::xr::{InputSourceProvider, XrInputSource, XrPointerEvent};
}
