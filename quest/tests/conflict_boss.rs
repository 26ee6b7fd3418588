//! Real-git scenarios: resume bootstrap and the level 3 merge-conflict boss.
//!
//! These drive lab scripts against an isolated git config, so they need a
//! `git` executable on PATH.

use quest::core::types::Flow;
use quest::curriculum::curriculum;
use quest::io::console::Tone;
use quest::lab::run_script;
use quest::orchestrator::{
    BOOTSTRAP_CONTENT, BOOTSTRAP_FILE, BootstrapOutcome, bootstrap_if_missing,
};
use quest::test_support::{ScriptedConsole, git_session};

const TRAP: [&str; 8] = [
    "git checkout -b fire-upgrade",
    "echo \"Hero Class: Fire Knight\" > hero.txt",
    "git add hero.txt",
    "git commit -m \"Upgrade hero to Fire Knight\"",
    "git checkout main",
    "echo \"Hero Class: Ice Wizard\" > hero.txt",
    "git add hero.txt",
    "git commit -m \"Upgrade hero to Ice Wizard\"",
];

#[test]
fn resume_bootstrap_creates_one_commit_once() {
    let (_temp, mut session) = git_session(ScriptedConsole::new(Vec::<String>::new()));

    assert_eq!(bootstrap_if_missing(&mut session), BootstrapOutcome::Created);
    assert!(session.workspace().has_vcs_root());
    assert_eq!(session.workspace().read_text(BOOTSTRAP_FILE), BOOTSTRAP_CONTENT);
    assert_eq!(session.repo().commit_count(), 1);
    assert_eq!(session.repo().current_branch().as_deref(), Some("main"));

    assert_eq!(
        bootstrap_if_missing(&mut session),
        BootstrapOutcome::AlreadyPresent
    );
    assert_eq!(session.repo().commit_count(), 1);
}

#[test]
fn merging_diverged_branches_reports_a_conflict() {
    let (_temp, mut session) = git_session(ScriptedConsole::new(TRAP));
    assert_eq!(bootstrap_if_missing(&mut session), BootstrapOutcome::Created);
    let course = curriculum();
    let scripts = (course.get(3).expect("level 3").build)("main");
    assert_eq!(run_script(&mut session, &scripts[3]).expect("trap"), Flow::Completed);

    let out = session.git(&["merge", "--no-edit", "fire-upgrade"]);
    assert!(!out.succeeded);
    assert!(out.reports_conflict());
    assert!(session.repo().has_conflict());
    assert!(session.workspace().read_text("hero.txt").contains("<<<<<<<"));
}

#[test]
fn conflict_blocks_progress_until_resolution_is_typed() {
    let mut inputs: Vec<&str> = TRAP.to_vec();
    inputs.push("git merge fire-upgrade");
    inputs.extend([
        "git commit -m \"done\"", // rejected: never looks inside hero.txt
        "cat hero.txt",
        "",
        "git status", // rejected: does not rewrite hero.txt
        "echo \"Hero Class: Fire-Ice Battle Mage\" > hero.txt",
        "git add hero.txt",
        "git commit -m \"Merge: combine fire and ice into Battle Mage\"",
        "",
    ]);
    let (_temp, mut session) = git_session(ScriptedConsole::new(inputs));
    assert_eq!(bootstrap_if_missing(&mut session), BootstrapOutcome::Created);

    let course = curriculum();
    let scripts = (course.get(3).expect("level 3").build)("main");
    let [trap, trigger, resolve] = &scripts[3..6] else {
        panic!("level 3 should end with the three boss scripts");
    };

    assert_eq!(run_script(&mut session, trap).expect("trap"), Flow::Completed);
    assert_eq!(run_script(&mut session, trigger).expect("trigger"), Flow::Completed);
    assert!(session.repo().has_conflict());
    assert!(session.console().mentions("CONFLICT"));
    assert!(
        !session
            .tracker()
            .achievements()
            .iter()
            .any(|name| name == "Conflict Resolver")
    );

    assert_eq!(run_script(&mut session, resolve).expect("resolve"), Flow::Completed);
    assert!(!session.repo().has_conflict());
    assert_eq!(
        session.workspace().read_text("hero.txt"),
        "Hero Class: Fire-Ice Battle Mage\n"
    );
    assert_eq!(session.console().lines_with(Tone::Hint).len(), 2);
    assert!(
        session
            .tracker()
            .achievements()
            .iter()
            .any(|name| name == "Conflict Resolver")
    );
    assert_eq!(session.console().remaining(), 0);
}
