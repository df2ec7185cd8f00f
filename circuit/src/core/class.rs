//! Element class vocabulary.
//!
//! Level files only name a class per tile; everything the builder and runner need
//! (kind, pin shape, behaviour, content tags) is derived here from that name.

use serde::Serialize;

use crate::core::transform::TransformOp;
use crate::core::types::ElemKind;

/// Branch-family behaviours; all share the `If` kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchClass {
    If,
    IfNot,
    Repeater,
    InvRepeater,
    Countdown,
}

/// Parsed element class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemClass {
    Input,
    Output,
    Mux,
    /// `pipe` / `special_pipe`.
    Pipe,
    /// `angle_pipe` / `special_angle_pipe`.
    AnglePipe,
    PipeConnect2,
    /// Any other class containing `pipe`: routes like a pipe, connects like a node.
    OtherPipe,
    Branch(BranchClass),
    Transform(TransformOp),
}

impl ElemClass {
    /// Resolve a class name. Returns `None` for classes the engine cannot run.
    pub fn parse(class: &str) -> Option<Self> {
        let parsed = match class {
            "elem_input" => Self::Input,
            "elem_output" => Self::Output,
            "elem_mux" => Self::Mux,
            "elem_if" => Self::Branch(BranchClass::If),
            "elem_ifnot" => Self::Branch(BranchClass::IfNot),
            "elem_repeater" => Self::Branch(BranchClass::Repeater),
            "elem_inv_repeater" => Self::Branch(BranchClass::InvRepeater),
            "pipe_connect2" => Self::PipeConnect2,
            "pipe" | "special_pipe" => Self::Pipe,
            "angle_pipe" | "special_angle_pipe" => Self::AnglePipe,
            _ => {
                if let Some(name) = class.strip_prefix("apply_") {
                    return TransformOp::from_name(name).map(Self::Transform);
                }
                if class.contains("_countdown") {
                    return countdown_initial_value(class)
                        .map(|_| Self::Branch(BranchClass::Countdown));
                }
                if class.contains("pipe") {
                    return Some(Self::OtherPipe);
                }
                return None;
            }
        };
        Some(parsed)
    }

    pub fn kind(&self) -> ElemKind {
        match self {
            Self::Input => ElemKind::Input,
            Self::Output => ElemKind::Output,
            Self::Mux => ElemKind::Mux,
            Self::Pipe | Self::AnglePipe | Self::OtherPipe => ElemKind::SimplePipe,
            Self::PipeConnect2 => ElemKind::PipeConnect2,
            Self::Branch(_) => ElemKind::If,
            Self::Transform(_) => ElemKind::Transform,
        }
    }
}

/// Initial counter of `elem_countdown0` ..= `elem_countdown3`.
pub fn countdown_initial_value(class: &str) -> Option<u8> {
    match class {
        "elem_countdown0" => Some(0),
        "elem_countdown1" => Some(1),
        "elem_countdown2" => Some(2),
        "elem_countdown3" => Some(3),
        _ => None,
    }
}

/// `special_*` elements win the primary (`next[0]`) slot of a branch.
pub fn is_special(class: &str) -> bool {
    class.starts_with("special_")
}

/// Cipher families a level exercises; read by the progression system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentTags {
    pub has_atbash: bool,
    pub has_rot13: bool,
    pub has_inc_dec: bool,
    pub has_shift: bool,
    pub has_negation: bool,
    pub has_cond_transform: bool,
    pub has_polygraphic: bool,
}

impl ContentTags {
    /// Record the tag of one class. The first matching rule wins.
    pub fn record(&mut self, class: &str) {
        const COND_SUFFIXES: [&str; 4] = ["_dotted", "_undotted", "_even", "_odd"];
        if COND_SUFFIXES.iter().any(|suffix| class.ends_with(suffix)) {
            self.has_cond_transform = true;
        } else if class.contains("polygraphic") {
            self.has_polygraphic = true;
        } else if class.contains("atbash") {
            self.has_atbash = true;
        } else if class.contains("rot13") {
            self.has_rot13 = true;
        } else if class.contains("add") || class.contains("sub") {
            self.has_inc_dec = true;
        } else if class.contains("rotate") || class.contains("reverse") {
            self.has_shift = true;
        } else if class.contains("ifnot") || class.contains("inv_repeater") {
            self.has_negation = true;
        }
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}
