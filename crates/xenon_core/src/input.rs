//! Synthetic input events injected into a UI tree
//!
//! Positions are in the tree's logical pixel space (top-left origin).

use std::fmt;
use std::str::FromStr;

use crate::geometry::Point;

/// Pointer event kinds the bridge injects
///
/// There is deliberately no `Over`/`Enter`: enter and leave transitions are
/// derived by the UI tree from the stream of moves and leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Up,
    Move,
    Leave,
}

impl PointerKind {
    /// DOM-style event name
    pub fn as_str(&self) -> &'static str {
        match self {
            PointerKind::Down => "pointerdown",
            PointerKind::Up => "pointerup",
            PointerKind::Move => "pointermove",
            PointerKind::Leave => "pointerleave",
        }
    }
}

impl fmt::Display for PointerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pointerdown" => Ok(PointerKind::Down),
            "pointerup" => Ok(PointerKind::Up),
            "pointermove" => Ok(PointerKind::Move),
            "pointerleave" => Ok(PointerKind::Leave),
            other => Err(format!("unsupported pointer event type: {other}")),
        }
    }
}

/// Pointer button identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerButton {
    #[default]
    Primary,
    Auxiliary,
    Secondary,
    Back,
    Forward,
    Other(u16),
}

impl PointerButton {
    /// Map a DOM `button` index (0 = primary, 1 = auxiliary, 2 = secondary, ...)
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            2 => PointerButton::Secondary,
            3 => PointerButton::Back,
            4 => PointerButton::Forward,
            n => PointerButton::Other(n),
        }
    }

    pub fn index(&self) -> u16 {
        match self {
            PointerButton::Primary => 0,
            PointerButton::Auxiliary => 1,
            PointerButton::Secondary => 2,
            PointerButton::Back => 3,
            PointerButton::Forward => 4,
            PointerButton::Other(n) => *n,
        }
    }
}

/// A pointer event in UI pixel space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub kind: PointerKind,
    pub position: Point,
    pub button: PointerButton,
    pub pointer_id: u32,
}

impl PointerInput {
    pub fn new(kind: PointerKind, x: f32, y: f32) -> Self {
        Self {
            kind,
            position: Point::new(x, y),
            button: PointerButton::Primary,
            pointer_id: 0,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}

/// A wheel (scroll) event in UI pixel space, deltas in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelInput {
    pub position: Point,
    pub delta_x: f32,
    pub delta_y: f32,
}

impl WheelInput {
    pub fn new(x: f32, y: f32, delta_x: f32, delta_y: f32) -> Self {
        Self {
            position: Point::new(x, y),
            delta_x,
            delta_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            PointerKind::Down,
            PointerKind::Up,
            PointerKind::Move,
            PointerKind::Leave,
        ] {
            assert_eq!(kind.as_str().parse::<PointerKind>(), Ok(kind));
        }
        assert!("pointerover".parse::<PointerKind>().is_err());
    }

    #[test]
    fn test_button_index() {
        assert_eq!(PointerButton::from_index(2), PointerButton::Secondary);
        assert_eq!(PointerButton::from_index(9).index(), 9);
    }
}
