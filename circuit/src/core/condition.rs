//! Branch conditions evaluated by `elem_if` / `elem_ifnot`.

use thiserror::Error;

use crate::core::text_ops;
use crate::core::types::IfExtra;

/// A branch condition resolved from `IfExtra` at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Same length and same multiset of bytes as the argument.
    Anagram(Vec<u8>),
    Eq(Vec<u8>),
    SubstrCount { needle: Vec<u8>, count: i64 },
    /// Any byte of the argument occurs in the buffer.
    ContainsLetter(Vec<u8>),
    ContainsSubstr(Vec<u8>),
    HasPrefix(Vec<u8>),
    HasSuffix(Vec<u8>),
    /// Last buffer byte is greater than the given byte.
    LastGt(u8),
    LenEven,
    FnvEven,
    LenEq(i64),
    LenLt(i64),
    LenGt(i64),
    /// Buffer still equals the run's original input.
    Unchanged,
    Fixed(bool),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unknown condition kind '{0}'")]
    UnknownKind(String),
    #[error("condition '{0}' requires a non-empty string_arg")]
    EmptyStringArg(&'static str),
}

impl Condition {
    pub fn from_extra(extra: &IfExtra) -> Result<Self, ConditionError> {
        let arg = extra.string_arg.as_bytes().to_vec();
        let int_arg = extra.int_arg;
        let cond = match extra.cond_kind.as_str() {
            "anagram" => Self::Anagram(arg),
            "eq" => Self::Eq(arg),
            "substr_count" => Self::SubstrCount {
                needle: arg,
                count: int_arg,
            },
            "contains_letter" => Self::ContainsLetter(arg),
            "contains_substr" => Self::ContainsSubstr(arg),
            "has_prefix" => Self::HasPrefix(arg),
            "has_suffix" => Self::HasSuffix(arg),
            "last_gt" => match arg.first() {
                Some(&b) => Self::LastGt(b),
                None => return Err(ConditionError::EmptyStringArg("last_gt")),
            },
            "len_even" => Self::LenEven,
            "fnv_even" => Self::FnvEven,
            "len_eq" => Self::LenEq(int_arg),
            "len_lt" => Self::LenLt(int_arg),
            "len_gt" => Self::LenGt(int_arg),
            "unchanged" => Self::Unchanged,
            "fixed_cond" => Self::Fixed(int_arg == 1),
            other => return Err(ConditionError::UnknownKind(other.to_string())),
        };
        Ok(cond)
    }

    /// The authoring name of this condition kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Anagram(_) => "anagram",
            Self::Eq(_) => "eq",
            Self::SubstrCount { .. } => "substr_count",
            Self::ContainsLetter(_) => "contains_letter",
            Self::ContainsSubstr(_) => "contains_substr",
            Self::HasPrefix(_) => "has_prefix",
            Self::HasSuffix(_) => "has_suffix",
            Self::LastGt(_) => "last_gt",
            Self::LenEven => "len_even",
            Self::FnvEven => "fnv_even",
            Self::LenEq(_) => "len_eq",
            Self::LenLt(_) => "len_lt",
            Self::LenGt(_) => "len_gt",
            Self::Unchanged => "unchanged",
            Self::Fixed(_) => "fixed_cond",
        }
    }

    /// Evaluate against the working buffer and the run's original input.
    pub fn eval(&self, buffer: &[u8], original: &[u8]) -> bool {
        let len = buffer.len() as i64;
        match self {
            Self::Anagram(arg) => text_ops::check_anagram(buffer, arg),
            Self::Eq(arg) => buffer == arg.as_slice(),
            Self::SubstrCount { needle, count } => {
                text_ops::count_occurrences(buffer, needle) as i64 == *count
            }
            Self::ContainsLetter(letters) => letters.iter().any(|b| buffer.contains(b)),
            Self::ContainsSubstr(needle) => text_ops::contains_subslice(buffer, needle),
            Self::HasPrefix(prefix) => buffer.starts_with(prefix),
            Self::HasSuffix(suffix) => buffer.ends_with(suffix),
            Self::LastGt(bound) => buffer.last().is_some_and(|last| last > bound),
            Self::LenEven => buffer.len() % 2 == 0,
            Self::FnvEven => text_ops::fnv1a64(buffer) % 2 == 0,
            Self::LenEq(n) => len == *n,
            Self::LenLt(n) => len < *n,
            Self::LenGt(n) => len > *n,
            Self::Unchanged => buffer == original,
            Self::Fixed(value) => *value,
        }
    }
}
