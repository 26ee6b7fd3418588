//! Learner session: progress, storage, backend and console tied together.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::progress::ProgressTracker;
use crate::core::types::Reward;
use crate::io::backend::{BackendOutput, Repo, VcsBackend};
use crate::io::config::QuestConfig;
use crate::io::console::{Console, Tone};
use crate::io::save_store::ProgressStore;
use crate::io::workspace::Workspace;
use crate::lab::StepContext;

/// One run of the tutor.
///
/// Owns the in-memory [`ProgressTracker`]; the store only sees it when the
/// session persists. A failed save flips the session into degraded mode: play
/// continues and progress lives in memory until the process exits.
pub struct Session<B, S, C> {
    config: QuestConfig,
    tracker: ProgressTracker,
    store: S,
    backend: B,
    console: C,
    workspace: Workspace,
    degraded: bool,
}

impl<B: VcsBackend, S: ProgressStore, C: Console> Session<B, S, C> {
    /// Open a session, restoring whatever progress the store holds.
    #[instrument(skip_all, fields(workspace = %workspace.root().display()))]
    pub fn open(
        config: QuestConfig,
        workspace: Workspace,
        backend: B,
        store: S,
        console: C,
        level_count: u32,
    ) -> Self {
        let state = store.load().into_state_or_default();
        let tracker = ProgressTracker::from_state(state, level_count);
        info!(
            experience_points = tracker.experience_points(),
            unlocked_level = tracker.unlocked_level(),
            "session opened"
        );
        Self {
            config,
            tracker,
            store,
            backend,
            console,
            workspace,
            degraded: false,
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn repo(&self) -> Repo<'_> {
        Repo::new(&self.backend, self.workspace.root())
    }

    /// Run a backend operation at the workspace root without narration.
    pub fn git(&self, args: &[&str]) -> BackendOutput {
        let Some((operation, rest)) = args.split_first() else {
            return BackendOutput::failed("no backend operation given");
        };
        self.backend.execute(operation, rest, self.workspace.root())
    }

    pub fn say(&mut self, tone: Tone, text: &str) {
        self.console.show(tone, text);
    }

    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.console.read_line(prompt)
    }

    /// Borrow the pieces an accept-action works with.
    pub fn step_context(&mut self) -> StepContext<'_> {
        StepContext::new(
            &self.workspace,
            &self.backend,
            &self.config,
            &mut self.console,
        )
    }

    /// Credit a step's reward and narrate it.
    ///
    /// An achievement already held is not announced again.
    pub fn grant(&mut self, reward: &Reward) {
        if reward.is_empty() {
            return;
        }
        if reward.points > 0 {
            self.tracker.award_points(reward.points);
            let line = if reward.reason.is_empty() {
                format!("+{} XP!", reward.points)
            } else {
                format!("+{} XP! {}", reward.points, reward.reason)
            };
            self.console.show(Tone::Reward, &line);
        }
        if let Some(name) = reward.achievement
            && self.tracker.unlock_achievement(name)
        {
            info!(achievement = name, "achievement unlocked");
            self.console.show(Tone::Achievement, name);
        }
    }

    /// Write progress to the store. Returns false if the write failed.
    ///
    /// The first failure is narrated; later ones only log.
    #[instrument(skip_all)]
    pub fn persist(&mut self) -> bool {
        match self.store.save(self.tracker.state()) {
            Ok(()) => true,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "progress could not be saved");
                self.degrade();
                false
            }
        }
    }

    /// Forget all progress, in memory and on disk. Returns false if the save
    /// record could not be deleted; play continues from a fresh state either way.
    #[instrument(skip_all)]
    pub fn new_game(&mut self) -> bool {
        self.tracker.reset();
        match self.store.clear() {
            Ok(()) => {
                info!("progress reset");
                true
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "save record could not be deleted");
                self.degrade();
                false
            }
        }
    }

    /// Enter degraded mode, narrating it the first time.
    fn degrade(&mut self) {
        if self.degraded {
            return;
        }
        self.degraded = true;
        self.console.show(
            Tone::Failure,
            "Progress could not be saved. You can keep playing, but this session's progress will be lost when you quit.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::ProgressState;
    use crate::test_support::{
        FailingStore, MemoryStore, RecordingBackend, ScriptedConsole, test_session,
    };

    #[test]
    fn open_restores_stored_progress() {
        let store = MemoryStore::with_state(ProgressState {
            experience_points: 250,
            achievements: vec!["First Commit".to_string()],
            unlocked_level: 3,
        });
        let session = Session::open(
            QuestConfig::default(),
            Workspace::new("/scratch/git-quest"),
            RecordingBackend::new(),
            store,
            ScriptedConsole::new(Vec::<String>::new()),
            8,
        );
        assert_eq!(session.tracker().experience_points(), 250);
        assert_eq!(session.tracker().unlocked_level(), 3);
    }

    #[test]
    fn grant_narrates_points_and_new_achievements_only() {
        let (_temp, mut session) =
            test_session(RecordingBackend::new(), ScriptedConsole::new(Vec::<String>::new()));
        let reward = Reward::points(20, "Branch created").with_achievement("Branch Master");
        session.grant(&reward);
        session.grant(&reward);

        assert_eq!(session.tracker().experience_points(), 40);
        assert_eq!(
            session.console().lines_with(Tone::Reward),
            vec!["+20 XP! Branch created", "+20 XP! Branch created"]
        );
        assert_eq!(session.console().lines_with(Tone::Achievement), vec!["Branch Master"]);
    }

    #[test]
    fn empty_reward_is_silent() {
        let (_temp, mut session) =
            test_session(RecordingBackend::new(), ScriptedConsole::new(Vec::<String>::new()));
        session.grant(&Reward::none());
        assert!(session.console().transcript().is_empty());
    }

    #[test]
    fn persist_writes_current_state() {
        let (_temp, mut session) =
            test_session(RecordingBackend::new(), ScriptedConsole::new(Vec::<String>::new()));
        session.tracker_mut().award_points(30);
        session.tracker_mut().raise_level(2);
        assert!(session.persist());
        let saved = session.store().saved().expect("saved");
        assert_eq!(saved.experience_points, 30);
        assert_eq!(saved.unlocked_level, 2);
    }

    #[test]
    fn failed_save_degrades_once() {
        let mut session = Session::open(
            QuestConfig::default(),
            Workspace::new("/scratch/git-quest"),
            RecordingBackend::new(),
            FailingStore,
            ScriptedConsole::new(Vec::<String>::new()),
            8,
        );
        session.tracker_mut().award_points(10);

        assert!(!session.persist());
        assert!(!session.persist());
        assert!(session.is_degraded());
        assert_eq!(session.tracker().experience_points(), 10);
        assert_eq!(session.console().lines_with(Tone::Failure).len(), 1);
    }

    #[test]
    fn new_game_clears_memory_and_store() {
        let (_temp, mut session) =
            test_session(RecordingBackend::new(), ScriptedConsole::new(Vec::<String>::new()));
        session.tracker_mut().award_points(100);
        session.tracker_mut().unlock_achievement("First Commit");
        session.persist();

        assert!(session.new_game());

        assert_eq!(session.tracker().state(), &ProgressState::default());
        assert!(session.store().saved().is_none());
    }

    #[test]
    fn failed_clear_resets_memory_and_degrades() {
        let mut session = Session::open(
            QuestConfig::default(),
            Workspace::new("/scratch/git-quest"),
            RecordingBackend::new(),
            FailingStore,
            ScriptedConsole::new(Vec::<String>::new()),
            8,
        );
        session.tracker_mut().award_points(70);

        assert!(!session.new_game());
        assert!(!session.persist());
        assert!(session.is_degraded());
        assert_eq!(session.tracker().state(), &ProgressState::default());
        assert_eq!(session.console().lines_with(Tone::Failure).len(), 1);
    }
}
