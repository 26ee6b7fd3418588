//! Progress lifecycle across the session, the JSON save file and level runs.

use quest::core::matcher::IntentRule;
use quest::core::progress::ProgressState;
use quest::core::types::{Flow, Reward};
use quest::curriculum::{Curriculum, LevelDef};
use quest::io::config::QuestConfig;
use quest::io::save_store::{JsonFileStore, LoadResult, ProgressStore};
use quest::io::workspace::Workspace;
use quest::lab::{Action, LabScript, LabStep};
use quest::orchestrator::run_level;
use quest::session::Session;
use quest::test_support::{FailingStore, RecordingBackend, ScriptedConsole};

fn status_level(_trunk: &str) -> Vec<LabScript> {
    vec![
        LabScript::new("LOOK AROUND", "Check the repository state.").step(
            LabStep::new("Check:", IntentRule::command("git status").phrase("git status"))
                .then(Action::git(["status"]))
                .reward(Reward::points(10, "Looked around").with_achievement("First Commit")),
        ),
    ]
}

fn one_level() -> Curriculum {
    Curriculum::new(vec![LevelDef {
        number: 1,
        name: "Look Around",
        summary: "One status check.",
        build: status_level,
    }])
}

fn file_session<S: ProgressStore>(
    workspace: Workspace,
    store: S,
    inputs: &[&str],
) -> Session<RecordingBackend, S, ScriptedConsole> {
    Session::open(
        QuestConfig::default(),
        workspace,
        RecordingBackend::new(),
        store,
        ScriptedConsole::new(inputs.iter().copied()),
        1,
    )
}

#[test]
fn completed_level_survives_a_restart() {
    let temp = tempfile::tempdir().expect("tempdir");
    let save = temp.path().join("git_quest_save.json");
    let workspace = Workspace::new(temp.path().join("git-quest"));

    let mut session = file_session(workspace.clone(), JsonFileStore::new(&save), &["git status"]);
    let outcome = run_level(&mut session, &one_level(), 1).expect("run");
    assert_eq!(outcome.flow, Flow::Completed);
    assert!(outcome.persisted);

    let reopened = file_session(workspace, JsonFileStore::new(&save), &[]);
    assert_eq!(reopened.tracker().experience_points(), 10);
    assert_eq!(reopened.tracker().unlocked_level(), 2);
    assert_eq!(reopened.tracker().achievements(), ["First Commit".to_string()]);
}

#[test]
fn reset_then_load_yields_defaults() {
    let temp = tempfile::tempdir().expect("tempdir");
    let save = temp.path().join("git_quest_save.json");
    let mut session = file_session(
        Workspace::new(temp.path().join("git-quest")),
        JsonFileStore::new(&save),
        &[],
    );
    session.tracker_mut().unlock_achievement("First Commit");
    assert!(session.persist());
    assert!(save.exists());

    assert!(session.new_game());

    assert!(!save.exists());
    let loaded = JsonFileStore::new(&save).load().into_state_or_default();
    assert_eq!(loaded, ProgressState::default());
}

#[test]
fn corrupt_save_starts_fresh() {
    let temp = tempfile::tempdir().expect("tempdir");
    let save = temp.path().join("git_quest_save.json");
    std::fs::write(&save, "{ not json").expect("write");

    let store = JsonFileStore::new(&save);
    assert!(matches!(store.load(), LoadResult::Unreadable(_)));
    let session = file_session(Workspace::new(temp.path().join("git-quest")), store, &[]);
    assert_eq!(session.tracker().state(), &ProgressState::default());
}

#[test]
fn abandoning_keeps_the_stored_watermark() {
    let temp = tempfile::tempdir().expect("tempdir");
    let save = temp.path().join("git_quest_save.json");
    let store = JsonFileStore::new(&save);
    store
        .save(&ProgressState {
            experience_points: 40,
            achievements: Vec::new(),
            unlocked_level: 1,
        })
        .expect("seed");

    let mut session = file_session(
        Workspace::new(temp.path().join("git-quest")),
        JsonFileStore::new(&save),
        &["git stats", ":quit"],
    );
    let outcome = run_level(&mut session, &one_level(), 1).expect("run");

    assert_eq!(outcome.flow, Flow::Abandoned);
    assert_eq!(outcome.unlocked_level, 1);
    let stored = JsonFileStore::new(&save).load().into_state_or_default();
    assert_eq!(stored.experience_points, 40);
    assert_eq!(stored.unlocked_level, 1);
}

#[test]
fn failing_store_degrades_without_aborting_the_level() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut session = file_session(
        Workspace::new(temp.path().join("git-quest")),
        FailingStore,
        &["git status"],
    );

    let outcome = run_level(&mut session, &one_level(), 1).expect("run");

    assert_eq!(outcome.flow, Flow::Completed);
    assert!(!outcome.persisted);
    assert!(session.is_degraded());
    assert_eq!(session.tracker().unlocked_level(), 2);
    assert_eq!(session.tracker().experience_points(), 10);
}
