//! `git-quest`: learn git by typing real commands.
//!
//! Without a subcommand the interactive main menu opens. Subcommands jump
//! straight into play or inspect the save record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quest::core::gating::GateError;
use quest::curriculum::{Curriculum, curriculum};
use quest::exit_codes;
use quest::io::backend::GitBackend;
use quest::io::config::{CONFIG_FILE, QuestConfig, load_config};
use quest::io::console::{Console, TerminalConsole, Tone};
use quest::io::save_store::JsonFileStore;
use quest::io::workspace::Workspace;
use quest::logging;
use quest::menu::{self, StartChoice, progress_report, resolve_start};
use quest::session::Session;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "git-quest",
    version,
    about = "Interactive git tutor: eight levels of hands-on labs"
)]
struct Cli {
    /// Config file (TOML). Defaults to `git-quest.toml` in the current directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scratch repository directory; overrides `workspace_dir`.
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Progress save file; overrides `save_path`.
    #[arg(long, global = true)]
    save_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Erase progress and start from level 1.
    New,
    /// Resume at the highest unlocked level.
    Continue,
    /// Play an unlocked level, then every level after it.
    Play {
        #[arg(short, long)]
        level: u32,
    },
    /// Print XP, level and achievements.
    Progress,
    /// Delete the save record.
    Reset,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let course = curriculum();

    let store = JsonFileStore::new(&config.save_path);
    let workspace = Workspace::new(&config.workspace_dir);
    let backend = GitBackend::from_config(&config);
    let mut session = Session::open(
        config,
        workspace,
        backend,
        store,
        TerminalConsole::stdio(),
        course.level_count(),
    );

    let choice = match cli.command {
        None => {
            menu::main_menu(&mut session, &course)?;
            return Ok(exit_codes::OK);
        }
        Some(Command::Progress) => {
            print_progress(&mut session, &course);
            return Ok(exit_codes::OK);
        }
        Some(Command::Reset) => {
            if !session.new_game() {
                session.say(Tone::Failure, "The save record could not be deleted.");
                return Ok(exit_codes::INVALID);
            }
            session.say(Tone::Success, "Progress reset.");
            return Ok(exit_codes::OK);
        }
        Some(Command::New) => StartChoice::NewGame,
        Some(Command::Continue) => StartChoice::Continue,
        Some(Command::Play { level }) => StartChoice::Level(level),
    };

    let request = match resolve_start(choice, session.tracker()) {
        Ok(request) => request,
        Err(err) => {
            eprintln!("{err}");
            return Ok(gate_exit_code(err));
        }
    };
    let flow = menu::start(&mut session, &course, request)?;
    info!(?flow, "run finished");
    Ok(exit_codes::OK)
}

/// Load the config file, then apply command-line overrides.
///
/// The workspace path is made absolute so later directory changes by
/// subprocesses can't move it.
fn resolve_config(cli: &Cli) -> Result<QuestConfig> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = load_config(&path)?;
    if let Some(workspace) = &cli.workspace {
        config.workspace_dir = workspace.clone();
    }
    if let Some(save_file) = &cli.save_file {
        config.save_path = save_file.clone();
    }
    config.workspace_dir = absolute(&config.workspace_dir)?;
    Ok(config)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve {}", path.display()))
}

fn print_progress<C: Console>(
    session: &mut Session<GitBackend, JsonFileStore, C>,
    course: &Curriculum,
) {
    let lines = progress_report(session.tracker(), course);
    session.say(Tone::Banner, "YOUR PROGRESS");
    for line in &lines {
        session.say(Tone::Story, line);
    }
}

fn gate_exit_code(err: GateError) -> i32 {
    match err {
        GateError::OutOfRange { .. } => exit_codes::INVALID,
        GateError::Locked { .. } => exit_codes::LOCKED,
        GateError::AllComplete => exit_codes::COMPLETE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_without_subcommand_opens_menu() {
        let cli = Cli::parse_from(["git-quest"]);
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_play_level_with_global_overrides() {
        let cli = Cli::parse_from([
            "git-quest",
            "play",
            "--level",
            "3",
            "--workspace",
            "/tmp/quest",
            "--save-file",
            "/tmp/save.json",
        ]);
        assert!(matches!(cli.command, Some(Command::Play { level: 3 })));
        assert_eq!(cli.workspace, Some(PathBuf::from("/tmp/quest")));
        assert_eq!(cli.save_file, Some(PathBuf::from("/tmp/save.json")));
    }

    #[test]
    fn overrides_replace_file_values() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = temp.path().join("quest.toml");
        std::fs::write(&config_path, "workspace_dir = \"from-file\"\ndefault_branch = \"trunk\"\n")
            .expect("write");
        let cli = Cli::parse_from([
            "git-quest".to_string(),
            "--config".to_string(),
            config_path.display().to_string(),
            "--workspace".to_string(),
            temp.path().join("ws").display().to_string(),
        ]);

        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.workspace_dir, temp.path().join("ws"));
        assert_eq!(config.default_branch, "trunk");
        assert_eq!(config.save_path, PathBuf::from("git_quest_save.json"));
    }

    #[test]
    fn gate_errors_map_to_stable_codes() {
        assert_eq!(
            gate_exit_code(GateError::Locked {
                level: 4,
                unlocked: 1
            }),
            exit_codes::LOCKED
        );
        assert_eq!(gate_exit_code(GateError::AllComplete), exit_codes::COMPLETE);
        assert_eq!(
            gate_exit_code(GateError::OutOfRange {
                level: 0,
                level_count: 8
            }),
            exit_codes::INVALID
        );
    }
}
