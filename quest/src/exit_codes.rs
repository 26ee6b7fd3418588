//! Stable exit codes for `git-quest` commands.

/// Command succeeded (including a learner leaving a level early).
pub const OK: i32 = 0;
/// Command failed due to invalid config, unreadable console, or other errors.
pub const INVALID: i32 = 1;
/// `git-quest play --level N` asked for a level above the unlocked watermark.
pub const LOCKED: i32 = 2;
/// `git-quest continue` found every level already complete.
pub const COMPLETE: i32 = 3;
