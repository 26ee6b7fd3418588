//! Progress state machine: experience, achievements, and the level watermark.
//!
//! Pure in-memory logic. Persistence lives in `io::save_store`; the session
//! decides when to save.

use serde::{Deserialize, Serialize};

/// Persisted learner progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressState {
    /// Cumulative experience points.
    pub experience_points: u64,
    /// Unlocked achievements in the order they were earned (unique).
    pub achievements: Vec<String>,
    /// Highest playable level (1-indexed). `level_count + 1` means all complete.
    pub unlocked_level: u32,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            experience_points: 0,
            achievements: Vec::new(),
            unlocked_level: 1,
        }
    }
}

/// Single source of truth for scoring and level gating within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressTracker {
    state: ProgressState,
    level_count: u32,
}

impl ProgressTracker {
    /// Fresh tracker for a curriculum with `level_count` levels.
    pub fn new(level_count: u32) -> Self {
        Self::from_state(ProgressState::default(), level_count)
    }

    /// Restore from a loaded state, normalizing anything out of range.
    pub fn from_state(mut state: ProgressState, level_count: u32) -> Self {
        let mut seen = Vec::with_capacity(state.achievements.len());
        for name in state.achievements.drain(..) {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        state.achievements = seen;
        state.unlocked_level = state.unlocked_level.clamp(1, level_count + 1);
        Self { state, level_count }
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn experience_points(&self) -> u64 {
        self.state.experience_points
    }

    pub fn achievements(&self) -> &[String] {
        &self.state.achievements
    }

    pub fn unlocked_level(&self) -> u32 {
        self.state.unlocked_level
    }

    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// True once every level has been completed.
    pub fn all_complete(&self) -> bool {
        self.state.unlocked_level > self.level_count
    }

    pub fn award_points(&mut self, amount: u32) {
        self.state.experience_points = self
            .state
            .experience_points
            .saturating_add(u64::from(amount));
    }

    /// Add `id` to the achievement set. Returns true only when newly granted.
    pub fn unlock_achievement(&mut self, id: &str) -> bool {
        if self.state.achievements.iter().any(|held| held == id) {
            return false;
        }
        self.state.achievements.push(id.to_string());
        true
    }

    /// Raise the watermark to `new_level`; never lowers it.
    pub fn raise_level(&mut self, new_level: u32) {
        let capped = new_level.min(self.level_count + 1);
        self.state.unlocked_level = self.state.unlocked_level.max(capped);
    }

    /// Restore defaults. The caller is responsible for deleting the save file.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn awards_accumulate() {
        let mut tracker = ProgressTracker::new(8);
        for amount in [10, 10, 0, 35] {
            tracker.award_points(amount);
        }
        assert_eq!(tracker.experience_points(), 55);
    }

    #[test]
    fn fresh_state_awarded_twice() {
        let mut tracker = ProgressTracker::new(8);
        tracker.award_points(10);
        tracker.award_points(10);
        assert_eq!(tracker.experience_points(), 20);
    }

    #[test]
    fn award_saturates_instead_of_overflowing() {
        let mut tracker = ProgressTracker::from_state(
            ProgressState {
                experience_points: u64::MAX - 1,
                ..ProgressState::default()
            },
            8,
        );
        tracker.award_points(10);
        assert_eq!(tracker.experience_points(), u64::MAX);
    }

    #[test]
    fn unlock_achievement_is_idempotent() {
        let mut tracker = ProgressTracker::new(8);
        assert!(tracker.unlock_achievement("First Commit"));
        assert!(!tracker.unlock_achievement("First Commit"));
        assert_eq!(tracker.achievements(), ["First Commit".to_string()]);
    }

    #[test]
    fn achievements_keep_insertion_order() {
        let mut tracker = ProgressTracker::new(8);
        tracker.unlock_achievement("Time Traveler");
        tracker.unlock_achievement("First Commit");
        assert_eq!(tracker.achievements(), ["Time Traveler", "First Commit"]);
    }

    #[test]
    fn raise_level_is_monotonic() {
        let mut tracker = ProgressTracker::new(8);
        tracker.raise_level(2);
        tracker.raise_level(1);
        assert_eq!(tracker.unlocked_level(), 2);
    }

    #[test]
    fn raise_level_caps_at_all_complete() {
        let mut tracker = ProgressTracker::new(8);
        tracker.raise_level(42);
        assert_eq!(tracker.unlocked_level(), 9);
        assert!(tracker.all_complete());
    }

    #[test]
    fn reset_restores_defaults() {
        let mut tracker = ProgressTracker::new(8);
        tracker.award_points(30);
        tracker.unlock_achievement("First Commit");
        tracker.raise_level(4);
        tracker.reset();
        assert_eq!(tracker.state(), &ProgressState::default());
    }

    #[test]
    fn from_state_normalizes_loaded_values() {
        let tracker = ProgressTracker::from_state(
            ProgressState {
                experience_points: 5,
                achievements: vec!["A".into(), "B".into(), "A".into()],
                unlocked_level: 0,
            },
            8,
        );
        assert_eq!(tracker.achievements(), ["A", "B"]);
        assert_eq!(tracker.unlocked_level(), 1);

        let tracker = ProgressTracker::from_state(
            ProgressState {
                unlocked_level: 99,
                ..ProgressState::default()
            },
            8,
        );
        assert_eq!(tracker.unlocked_level(), 9);
    }
}
