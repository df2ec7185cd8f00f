//! Shared deterministic types for the schema core.
//!
//! These types describe puzzle elements independently of the tile-map format they
//! are decoded from. They carry no I/O and are cheap to construct in tests.

use std::fmt;

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Stable element identifier: the element's index in template order.
pub type ElemId = usize;

/// Tile rotation, restricted to quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Map a rotation in degrees onto a quarter turn.
    ///
    /// Returns `None` for anything that is not exactly 0, 90, 180 or 270.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if degrees.fract() != 0.0 {
            return None;
        }
        match degrees as i64 {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    pub fn radians(self) -> f64 {
        f64::from(self.degrees()).to_radians()
    }
}

/// Per-class payload attached to an element at decode time.
///
/// Closed set: the builder and runner match on it instead of probing for types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ElemExtra {
    #[default]
    None,
    /// `angle_pipe` / `special_angle_pipe`.
    Angle { flip_horizontally: bool },
    /// `elem_countdownN`, `initial_value` in `0..=3`.
    Countdown { initial_value: u8 },
    /// `elem_if` / `elem_ifnot`.
    If(IfExtra),
}

/// Raw branch condition as authored in the level file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IfExtra {
    pub cond_kind: String,
    pub string_arg: String,
    pub int_arg: i64,
}

/// Structural role of an element, derived from its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElemKind {
    Input,
    Output,
    Mux,
    SimplePipe,
    PipeConnect2,
    If,
    Transform,
}

/// Class and position of an element, used to point at it in error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ElemRef {
    pub class: String,
    pub pos: Point,
}

impl ElemRef {
    pub fn new(class: impl Into<String>, pos: Point) -> Self {
        Self {
            class: class.into(),
            pos,
        }
    }
}

impl fmt::Display for ElemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}): {}", self.pos.x, self.pos.y, self.class)
    }
}
