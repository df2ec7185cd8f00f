//! Transform elements (`apply_*` classes) and the primitives they run.

use crate::core::text_ops;

/// Which bytes of the buffer a per-character map touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span {
    All,
    First,
    Last,
    ButFirst,
    ButLast,
    /// 1-indexed odd positions.
    Odd,
    /// 1-indexed even positions.
    Even,
}

/// Per-character cipher function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharMap {
    Rot13,
    Atbash,
    Inc,
    Dec,
    IncNowrap,
    DecNowrap,
    IncDotted,
    DecUndotted,
    HardshiftLeft,
    HardshiftRight,
}

/// A single buffer transformation, resolved from an `apply_*` class name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    Reverse,
    SwapHalves,
    Zigzag,
    PolygraphicAtbash,
    RotateLeft { skip_first: bool },
    RotateRight { skip_first: bool },
    Map(CharMap, Span),
}

/// Class suffix (after `apply_`) to operation.
const TRANSFORMS: &[(&str, TransformOp)] = &[
    ("reverse", TransformOp::Reverse),
    ("swap_halves", TransformOp::SwapHalves),
    ("zigzag", TransformOp::Zigzag),
    ("polygraphic_atbash", TransformOp::PolygraphicAtbash),
    ("rotate_left", TransformOp::RotateLeft { skip_first: false }),
    ("rotate_left_butfirst", TransformOp::RotateLeft { skip_first: true }),
    ("rotate_right", TransformOp::RotateRight { skip_first: false }),
    ("rotate_right_butfirst", TransformOp::RotateRight { skip_first: true }),
    ("rot13", TransformOp::Map(CharMap::Rot13, Span::All)),
    ("rot13_first", TransformOp::Map(CharMap::Rot13, Span::First)),
    ("rot13_butfirst", TransformOp::Map(CharMap::Rot13, Span::ButFirst)),
    ("rot13_butlast", TransformOp::Map(CharMap::Rot13, Span::ButLast)),
    ("atbash", TransformOp::Map(CharMap::Atbash, Span::All)),
    ("atbash_first", TransformOp::Map(CharMap::Atbash, Span::First)),
    ("atbash_butlast", TransformOp::Map(CharMap::Atbash, Span::ButLast)),
    ("add", TransformOp::Map(CharMap::Inc, Span::All)),
    ("add_first", TransformOp::Map(CharMap::Inc, Span::First)),
    ("add_last", TransformOp::Map(CharMap::Inc, Span::Last)),
    ("add_butfirst", TransformOp::Map(CharMap::Inc, Span::ButFirst)),
    ("add_odd", TransformOp::Map(CharMap::Inc, Span::Odd)),
    ("add_even", TransformOp::Map(CharMap::Inc, Span::Even)),
    ("add_nowrap", TransformOp::Map(CharMap::IncNowrap, Span::All)),
    (
        "add_butfirst_nowrap",
        TransformOp::Map(CharMap::IncNowrap, Span::ButFirst),
    ),
    ("add_dotted", TransformOp::Map(CharMap::IncDotted, Span::All)),
    (
        "add_butfirst_dotted",
        TransformOp::Map(CharMap::IncDotted, Span::ButFirst),
    ),
    ("sub", TransformOp::Map(CharMap::Dec, Span::All)),
    ("sub_first", TransformOp::Map(CharMap::Dec, Span::First)),
    ("sub_last", TransformOp::Map(CharMap::Dec, Span::Last)),
    ("sub_butlast", TransformOp::Map(CharMap::Dec, Span::ButLast)),
    ("sub_odd", TransformOp::Map(CharMap::Dec, Span::Odd)),
    ("sub_even", TransformOp::Map(CharMap::Dec, Span::Even)),
    ("sub_nowrap", TransformOp::Map(CharMap::DecNowrap, Span::All)),
    ("sub_undotted", TransformOp::Map(CharMap::DecUndotted, Span::All)),
    (
        "hardshift_left",
        TransformOp::Map(CharMap::HardshiftLeft, Span::All),
    ),
    (
        "hardshift_right",
        TransformOp::Map(CharMap::HardshiftRight, Span::All),
    ),
];

impl CharMap {
    pub fn apply(self, b: u8) -> u8 {
        match self {
            Self::Rot13 => text_ops::rot13_char(b),
            Self::Atbash => text_ops::atbash_char(b),
            Self::Inc => text_ops::inc_char(b),
            Self::Dec => text_ops::dec_char(b),
            Self::IncNowrap => text_ops::inc_char_nowrap(b),
            Self::DecNowrap => text_ops::dec_char_nowrap(b),
            Self::IncDotted => text_ops::inc_char_dotted(b),
            Self::DecUndotted => text_ops::dec_char_undotted(b),
            Self::HardshiftLeft => text_ops::hardshift_left_char(b),
            Self::HardshiftRight => text_ops::hardshift_right_char(b),
        }
    }
}

impl Span {
    fn map(self, buf: &mut [u8], f: impl Fn(u8) -> u8) {
        match self {
            Self::All => text_ops::map_chars(buf, f),
            Self::First => {
                if let Some(b) = buf.first_mut() {
                    *b = f(*b);
                }
            }
            Self::Last => {
                if let Some(b) = buf.last_mut() {
                    *b = f(*b);
                }
            }
            Self::ButFirst => text_ops::map_chars_butfirst(buf, f),
            Self::ButLast => text_ops::map_chars_butlast(buf, f),
            Self::Odd => text_ops::map_odd_chars(buf, f),
            Self::Even => text_ops::map_even_chars(buf, f),
        }
    }
}

impl TransformOp {
    /// Resolve the suffix of an `apply_*` class.
    pub fn from_name(name: &str) -> Option<Self> {
        TRANSFORMS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|&(_, op)| op)
    }

    /// All known suffixes, in table order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        TRANSFORMS.iter().map(|&(name, _)| name)
    }

    /// Apply the transformation to `buf` in place.
    pub fn apply(self, buf: &mut [u8]) {
        match self {
            Self::Reverse => text_ops::reverse(buf),
            Self::SwapHalves => text_ops::swap_halves(buf),
            Self::Zigzag => text_ops::zigzag(buf),
            Self::PolygraphicAtbash => text_ops::polygraphic_atbash(buf),
            Self::RotateLeft { skip_first } => {
                text_ops::rotate_chars_left(tail(buf, skip_first));
            }
            Self::RotateRight { skip_first } => {
                text_ops::rotate_chars_right(tail(buf, skip_first));
            }
            Self::Map(char_map, span) => span.map(buf, |b| char_map.apply(b)),
        }
    }
}

fn tail(buf: &mut [u8], skip_first: bool) -> &mut [u8] {
    if skip_first && !buf.is_empty() {
        &mut buf[1..]
    } else {
        buf
    }
}
