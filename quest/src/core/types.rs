//! Shared deterministic types for lab execution.
//!
//! These types define stable contracts between the lab engine, the
//! orchestrator and the navigation layer.

/// Points (and optionally an achievement) granted when a step is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reward {
    pub points: u32,
    /// Short reason shown next to the points.
    pub reason: &'static str,
    pub achievement: Option<&'static str>,
}

impl Reward {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn points(points: u32, reason: &'static str) -> Self {
        Self {
            points,
            reason,
            achievement: None,
        }
    }

    pub fn with_achievement(mut self, name: &'static str) -> Self {
        self.achievement = Some(name);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.points == 0 && self.achievement.is_none()
    }
}

/// Lifecycle of a single lab step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    /// Waiting for learner input that matches the intent rule.
    Prompting,
    /// Input accepted; actions are being applied.
    Applying,
    /// Reward granted; the step is finished.
    Rewarded,
}

/// How a step, script or level ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Every step reached [`StepPhase::Rewarded`].
    Completed,
    /// The learner asked to leave (or input ended) before completion.
    Abandoned,
}

/// Result of playing one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelOutcome {
    pub level: u32,
    pub flow: Flow,
    /// Watermark after the level (unchanged when abandoned).
    pub unlocked_level: u32,
    /// False when the save after completion failed (degraded session).
    pub persisted: bool,
}
