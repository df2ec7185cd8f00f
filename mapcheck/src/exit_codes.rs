//! Stable exit codes for mapcheck commands.

/// Every checked level is playable / the command succeeded.
pub const OK: i32 = 0;
/// At least one level was rejected, or the command failed.
pub const INVALID: i32 = 1;
