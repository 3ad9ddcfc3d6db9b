//! XR input surface
//!
//! Plain data mirrors of what an XR session exposes: controllers with
//! optional gamepads, and ray hits on the UI quad.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use xenon_core::Vec2;

/// Which hand a controller is held in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Handedness {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GamepadButton {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

/// Standard XR gamepad mapping
///
/// Axes 2 and 3 are the primary thumbstick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gamepad {
    pub axes: SmallVec<[f32; 4]>,
    pub buttons: SmallVec<[GamepadButton; 8]>,
}

impl Gamepad {
    pub fn with_axes(axes: &[f32]) -> Self {
        Self {
            axes: SmallVec::from_slice(axes),
            buttons: SmallVec::new(),
        }
    }

    /// Axis value, 0 when the axis is not reported
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    /// Primary thumbstick `(x, y)`; y is positive when pushed toward the user
    pub fn thumbstick(&self) -> (f32, f32) {
        (self.axis(2), self.axis(3))
    }
}

/// One tracked controller
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XrInputSource {
    pub handedness: Handedness,
    pub gamepad: Option<Gamepad>,
}

impl XrInputSource {
    pub fn new(handedness: Handedness, gamepad: Option<Gamepad>) -> Self {
        Self { handedness, gamepad }
    }
}

pub type InputSources = SmallVec<[XrInputSource; 2]>;

/// Read access to the session's current input sources
pub trait InputSourceProvider {
    fn input_sources(&self) -> InputSources;
}

/// Input sources pushed by the host once per XR frame
#[derive(Clone, Debug, Default)]
pub struct SharedInputSources {
    sources: Rc<RefCell<InputSources>>,
}

impl SharedInputSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sources: impl IntoIterator<Item = XrInputSource>) {
        *self.sources.borrow_mut() = sources.into_iter().collect();
    }

    pub fn clear(&self) {
        self.sources.borrow_mut().clear();
    }
}

impl InputSourceProvider for SharedInputSources {
    fn input_sources(&self) -> InputSources {
        self.sources.borrow().clone()
    }
}

/// A controller ray hit on the UI quad
///
/// `uv` is `None` when the hit carried no texture coordinates; such events
/// are dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XrPointerEvent {
    pub uv: Option<Vec2>,
    pub button: u16,
    pub pointer_id: Option<u32>,
}

impl XrPointerEvent {
    pub fn at(u: f32, v: f32) -> Self {
        Self {
            uv: Some(Vec2::new(u, v)),
            ..Self::default()
        }
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = button;
        self
    }

    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = Some(pointer_id);
        self
    }
}

/// A pointer event on a flat on-screen image, in client coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DomPointerEvent {
    pub client_x: f32,
    pub client_y: f32,
    pub button: u16,
    pub pointer_id: u32,
}

impl DomPointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self {
            client_x,
            client_y,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_axes_read_as_zero() {
        let pad = Gamepad::with_axes(&[0.0, 0.0]);
        assert_eq!(pad.thumbstick(), (0.0, 0.0));
        let pad = Gamepad::with_axes(&[0.0, 0.0, 0.5, -0.25]);
        assert_eq!(pad.thumbstick(), (0.5, -0.25));
    }

    #[test]
    fn test_shared_sources_replace() {
        let shared = SharedInputSources::new();
        shared.set([XrInputSource::new(Handedness::Right, None)]);
        assert_eq!(shared.input_sources().len(), 1);
        shared.clear();
        assert!(shared.input_sources().is_empty());
    }
}
