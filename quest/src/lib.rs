//! Interactive git tutor driven by real commands.
//!
//! The learner types commands; each one is checked for intent against the
//! current lab step, applied to a disposable scratch repository, and rewarded.
//! The crate keeps the same split as a classic core/shell design:
//!
//! - **[`core`]**: Pure logic (intent matching, progress state machine, level
//!   gating). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (git subprocesses, scratch workspace
//!   files, save file, learner console, config).
//!
//! [`lab`], [`session`] and [`orchestrator`] tie the two together, while
//! [`menu`] and [`curriculum`] sit on the outside as navigation and content.

pub mod core;
pub mod curriculum;
pub mod exit_codes;
pub mod io;
pub mod lab;
pub mod logging;
pub mod menu;
pub mod orchestrator;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
