//! File-system helpers: configuration, tilesets and level files.

pub mod config;
pub mod levels;
