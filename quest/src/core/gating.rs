//! Level gating rules applied by navigation before a level starts.

use std::fmt;

/// Why a start request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    /// Level number outside `1..=level_count`.
    OutOfRange { level: u32, level_count: u32 },
    /// Level exists but is above the unlocked watermark.
    Locked { level: u32, unlocked: u32 },
    /// "Continue" requested with every level already complete.
    AllComplete,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::OutOfRange { level, level_count } => {
                write!(f, "level {level} does not exist (choose 1-{level_count})")
            }
            GateError::Locked { level, unlocked } => {
                write!(
                    f,
                    "level {level} is locked; complete level {unlocked} first"
                )
            }
            GateError::AllComplete => write!(
                f,
                "all levels are complete; start a new game or select a level"
            ),
        }
    }
}

impl std::error::Error for GateError {}

/// Where a run should begin, as decided by navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartRequest {
    pub selected_level: u32,
    pub new_game_requested: bool,
}

/// Check that `level` may be played given the current watermark.
pub fn check_selectable(level: u32, unlocked: u32, level_count: u32) -> Result<(), GateError> {
    if level == 0 || level > level_count {
        return Err(GateError::OutOfRange { level, level_count });
    }
    if level > unlocked {
        return Err(GateError::Locked { level, unlocked });
    }
    Ok(())
}

/// Resolve "continue" to the watermark level.
pub fn continue_level(unlocked: u32, level_count: u32) -> Result<u32, GateError> {
    if unlocked > level_count {
        return Err(GateError::AllComplete);
    }
    Ok(unlocked.max(1))
}

/// Display status of a level in the select menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Completed,
    Current,
    Locked,
}

pub fn level_status(level: u32, unlocked: u32) -> LevelStatus {
    match level.cmp(&unlocked) {
        std::cmp::Ordering::Less => LevelStatus::Completed,
        std::cmp::Ordering::Equal => LevelStatus::Current,
        std::cmp::Ordering::Greater => LevelStatus::Locked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlocked_levels_are_selectable() {
        assert_eq!(check_selectable(1, 1, 8), Ok(()));
        assert_eq!(check_selectable(3, 3, 8), Ok(()));
        assert_eq!(check_selectable(2, 9, 8), Ok(()));
    }

    #[test]
    fn levels_above_watermark_are_locked() {
        assert_eq!(
            check_selectable(4, 2, 8),
            Err(GateError::Locked {
                level: 4,
                unlocked: 2
            })
        );
    }

    #[test]
    fn out_of_range_levels_are_rejected() {
        assert!(matches!(
            check_selectable(0, 9, 8),
            Err(GateError::OutOfRange { .. })
        ));
        assert!(matches!(
            check_selectable(9, 9, 8),
            Err(GateError::OutOfRange { .. })
        ));
    }

    #[test]
    fn continue_uses_watermark_until_complete() {
        assert_eq!(continue_level(3, 8), Ok(3));
        assert_eq!(continue_level(9, 8), Err(GateError::AllComplete));
    }

    #[test]
    fn status_relative_to_watermark() {
        assert_eq!(level_status(1, 3), LevelStatus::Completed);
        assert_eq!(level_status(3, 3), LevelStatus::Current);
        assert_eq!(level_status(4, 3), LevelStatus::Locked);
    }
}
