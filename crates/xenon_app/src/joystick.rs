//! Thumbstick scrolling
//!
//! Each XR frame, controllers whose primary thumbstick is pushed past the
//! dead zone produce one wheel event at the last known pointer position.

use xenon_core::SceneRoot;
use xenon_platform::{Gamepad, XrInputSource};

use crate::pointer::PointerBridge;

/// Stick deflection at or below this magnitude on both axes is ignored
pub const DEADZONE: f32 = 0.1;

/// Translates thumbstick deflection into wheel deltas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoystickScroll {
    pub enabled: bool,
    /// Wheel pixels per frame at full deflection
    pub sensitivity: f32,
}

impl Default for JoystickScroll {
    fn default() -> Self {
        Self {
            enabled: true,
            sensitivity: 50.0,
        }
    }
}

impl JoystickScroll {
    pub fn new(enabled: bool, sensitivity: f32) -> Self {
        Self {
            enabled,
            sensitivity,
        }
    }

    /// Wheel delta for one gamepad, `None` inside the dead zone
    ///
    /// Pushing the stick away from the user (negative y) scrolls content
    /// down, so the vertical delta is inverted.
    pub fn scroll_delta(&self, gamepad: &Gamepad) -> Option<(f32, f32)> {
        let (x, y) = gamepad.thumbstick();
        if x.abs() <= DEADZONE && y.abs() <= DEADZONE {
            return None;
        }
        Some((x * self.sensitivity, -y * self.sensitivity))
    }

    /// Emit wheel events for every deflected controller
    ///
    /// Returns the number of wheel events injected. Nothing happens while
    /// disabled or before any pointer position is known.
    pub fn poll<'a, R: SceneRoot + 'static>(
        &self,
        sources: impl IntoIterator<Item = &'a XrInputSource>,
        bridge: &PointerBridge<R>,
    ) -> usize {
        if !self.enabled {
            return 0;
        }
        let Some(anchor) = bridge.last_any_position() else {
            return 0;
        };

        let mut injected = 0;
        for source in sources {
            let Some(gamepad) = source.gamepad.as_ref() else {
                continue;
            };
            let Some((dx, dy)) = self.scroll_delta(gamepad) else {
                continue;
            };
            tracing::trace!(handedness = ?source.handedness, dx, dy, "thumbstick scroll");
            if bridge.inject_wheel_event(anchor.x, anchor.y, dx, dy) {
                injected += 1;
            }
        }
        injected
    }
}
