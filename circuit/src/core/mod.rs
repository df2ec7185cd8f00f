//! Deterministic, pure puzzle logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod builder;
pub mod class;
pub mod condition;
pub mod geometry;
pub mod runner;
pub mod schema;
pub mod session;
pub mod template;
pub mod text_ops;
pub mod transform;
pub mod types;
