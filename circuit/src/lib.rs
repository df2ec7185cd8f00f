//! Puzzle-circuit engine for a cipher-decoding game.
//!
//! A level places typed elements (input, output, pipes, transforms, branches) on
//! a fixed grid. The engine infers the wiring from tile geometry, validates it,
//! and interprets the resulting graph on string inputs.
//!
//! - **[`core`]**: Pure, deterministic logic (text ops, graph building, the
//!   runner, puzzle sessions). No I/O, fully testable in isolation.
//! - **[`io`]**: File-system side of the tooling (config, tilesets, level scans).
//!
//! [`tiled`] and [`level`] decode Tiled JSON level files into templates and
//! tie decoding and building together for validation.

pub mod core;
pub mod io;
pub mod level;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tiled;

