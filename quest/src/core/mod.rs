//! Deterministic, pure logic shared by the tutor.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod gating;
pub mod matcher;
pub mod progress;
pub mod types;
