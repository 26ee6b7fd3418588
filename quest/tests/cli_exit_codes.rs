//! CLI tests for `git-quest` exit codes.
//!
//! Spawns the binary against a temp save file and workspace; none of these
//! paths reach an interactive prompt.

use std::path::Path;
use std::process::{Command, Output, Stdio};

use quest::core::progress::ProgressState;
use quest::exit_codes;
use quest::io::save_store::{JsonFileStore, ProgressStore};

fn git_quest(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_git-quest"))
        .current_dir(dir)
        .args(args)
        .arg("--save-file")
        .arg(dir.join("save.json"))
        .arg("--workspace")
        .arg(dir.join("git-quest"))
        .stdin(Stdio::null())
        .output()
        .expect("run git-quest")
}

fn seed(dir: &Path, state: &ProgressState) {
    JsonFileStore::new(dir.join("save.json"))
        .save(state)
        .expect("seed save");
}

#[test]
fn play_locked_level_exits_with_locked_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = git_quest(temp.path(), &["play", "--level", "3"]);
    assert_eq!(output.status.code(), Some(exit_codes::LOCKED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("level 3 is locked"));
    assert!(!temp.path().join("git-quest").exists());
}

#[test]
fn play_unknown_level_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = git_quest(temp.path(), &["play", "--level", "12"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn continue_after_finishing_exits_with_complete_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(
        temp.path(),
        &ProgressState {
            experience_points: 1910,
            achievements: vec!["Git Master".to_string()],
            unlocked_level: 9,
        },
    );
    let output = git_quest(temp.path(), &["continue"]);
    assert_eq!(output.status.code(), Some(exit_codes::COMPLETE));
}

#[test]
fn progress_prints_saved_state() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(
        temp.path(),
        &ProgressState {
            experience_points: 250,
            achievements: vec!["First Commit".to_string()],
            unlocked_level: 3,
        },
    );
    let output = git_quest(temp.path(), &["progress"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("XP: 250 /"));
    assert!(stdout.contains("Level: 3 / 8"));
    assert!(stdout.contains("First Commit"));
}

#[test]
fn reset_deletes_the_save_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    seed(temp.path(), &ProgressState::default());
    let output = git_quest(temp.path(), &["reset"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!temp.path().join("save.json").exists());
}

#[test]
fn invalid_config_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("git-quest.toml"), "backend_timeout_secs = 0\n")
        .expect("write config");
    let output = git_quest(temp.path(), &["progress"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("backend_timeout_secs"));
}
