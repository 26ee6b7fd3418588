//! I/O adapters for the tutor: git backend, scratch workspace, save file,
//! learner console, and configuration.

pub mod backend;
pub mod config;
pub mod console;
pub mod process;
pub mod save_store;
pub mod workspace;
