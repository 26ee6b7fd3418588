//! Navigation: main menu, level select and progress screen.
//!
//! Everything here turns learner choices into a [`StartRequest`] and hands it
//! to the orchestrator. Gating itself lives in `core::gating`.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::gating::{
    GateError, LevelStatus, StartRequest, check_selectable, continue_level, level_status,
};
use crate::core::progress::ProgressTracker;
use crate::core::types::Flow;
use crate::curriculum::Curriculum;
use crate::io::backend::VcsBackend;
use crate::io::console::{Console, Tone};
use crate::io::save_store::ProgressStore;
use crate::orchestrator::{FINAL_ACHIEVEMENT, run_from};
use crate::session::Session;

const MENU_PROMPT: &str = "Choose (1-5): ";
const BACK_PROMPT: &str = "Press ENTER to go back...";
const PROGRESS_BAR_WIDTH: u64 = 30;

/// How the learner wants to start playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartChoice {
    NewGame,
    Continue,
    Level(u32),
}

/// One main-menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    NewGame,
    Continue,
    LevelSelect,
    Progress,
    Quit,
}

impl MenuChoice {
    /// Parse a menu answer: the entry number or its name.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "1" | "new" => Some(MenuChoice::NewGame),
            "2" | "continue" => Some(MenuChoice::Continue),
            "3" | "select" | "levels" => Some(MenuChoice::LevelSelect),
            "4" | "progress" => Some(MenuChoice::Progress),
            "5" | "q" | "quit" | "exit" => Some(MenuChoice::Quit),
            _ => None,
        }
    }
}

/// Check a start choice against the learner's progress.
///
/// A new game always starts at level 1 with the reset flag set; continuing
/// resolves to the watermark; an explicit level must be unlocked.
pub fn resolve_start(
    choice: StartChoice,
    tracker: &ProgressTracker,
) -> Result<StartRequest, GateError> {
    let (unlocked, level_count) = (tracker.unlocked_level(), tracker.level_count());
    match choice {
        StartChoice::NewGame => Ok(StartRequest {
            selected_level: 1,
            new_game_requested: true,
        }),
        StartChoice::Continue => Ok(StartRequest {
            selected_level: continue_level(unlocked, level_count)?,
            new_game_requested: false,
        }),
        StartChoice::Level(level) => {
            check_selectable(level, unlocked, level_count)?;
            Ok(StartRequest {
                selected_level: level,
                new_game_requested: false,
            })
        }
    }
}

/// Carry out a resolved start request.
#[instrument(
    skip_all,
    fields(level = request.selected_level, new_game = request.new_game_requested)
)]
pub fn start<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
    request: StartRequest,
) -> Result<Flow> {
    if request.new_game_requested {
        session.new_game();
        title_screen(session, curriculum);
    }
    run_from(session, curriculum, request.selected_level)
}

fn title_screen<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
) {
    session.say(Tone::Banner, "THE GIT QUEST");
    session.say(Tone::Story, "An interactive game to learn Git.");
    session.say(
        Tone::Story,
        &format!(
            "{} levels of hands-on labs, {} XP to earn, {} achievements to unlock.",
            curriculum.level_count(),
            curriculum.total_points(),
            achievement_total(curriculum)
        ),
    );
    session.say(
        Tone::Story,
        "You learn Git by doing. Type commands when asked; the game checks your work.",
    );
}

/// Interactive main menu. Returns when the learner quits or input ends.
pub fn main_menu<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
) -> Result<()> {
    loop {
        show_main_menu(session);
        let Some(input) = session.read_line(MENU_PROMPT)? else {
            return Ok(());
        };
        let Some(choice) = MenuChoice::parse(&input) else {
            debug!(input = %input, "unknown menu choice");
            session.say(Tone::Hint, "Pick a number from 1 to 5.");
            continue;
        };

        let start_choice = match choice {
            MenuChoice::NewGame => StartChoice::NewGame,
            MenuChoice::Continue => StartChoice::Continue,
            MenuChoice::LevelSelect => match level_select(session, curriculum)? {
                Some(level) => StartChoice::Level(level),
                None => continue,
            },
            MenuChoice::Progress => {
                progress_screen(session, curriculum);
                if session.read_line(BACK_PROMPT)?.is_none() {
                    return Ok(());
                }
                continue;
            }
            MenuChoice::Quit => {
                session.say(Tone::Story, "Until next time, adventurer!");
                return Ok(());
            }
        };

        match resolve_start(start_choice, session.tracker()) {
            Ok(request) => {
                start(session, curriculum, request)?;
            }
            Err(GateError::AllComplete) => session.say(
                Tone::Success,
                "You've completed all levels! Start a new game or select a level.",
            ),
            Err(err) => session.say(Tone::Failure, &err.to_string()),
        }
    }
}

fn show_main_menu<B: VcsBackend, S: ProgressStore, C: Console>(session: &mut Session<B, S, C>) {
    let tracker = session.tracker();
    let continue_label = if tracker.all_complete() {
        "All Complete!".to_string()
    } else {
        format!("Level {}", tracker.unlocked_level())
    };
    session.say(Tone::Banner, "THE GIT QUEST");
    for line in [
        "1. New Game".to_string(),
        format!("2. Continue ({continue_label})"),
        "3. Level Select".to_string(),
        "4. Progress".to_string(),
        "5. Quit".to_string(),
    ] {
        session.say(Tone::Instruction, &line);
    }
}

/// Level list with completion state. Returns the chosen unlocked level,
/// or `None` to go back.
fn level_select<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
) -> Result<Option<u32>> {
    loop {
        session.say(Tone::Banner, "LEVEL SELECT");
        for line in level_select_lines(session.tracker(), curriculum) {
            session.say(Tone::Instruction, &line);
        }
        let prompt = format!("Choose level (1-{}) or 'back': ", curriculum.level_count());
        let Some(input) = session.read_line(&prompt)? else {
            return Ok(None);
        };
        let input = input.trim().to_ascii_lowercase();
        if input == "b" || input == "back" {
            return Ok(None);
        }
        let Ok(level) = input.parse::<u32>() else {
            session.say(Tone::Hint, "Type a level number, or 'back'.");
            continue;
        };
        match resolve_start(StartChoice::Level(level), session.tracker()) {
            Ok(request) => return Ok(Some(request.selected_level)),
            Err(err) => session.say(Tone::Failure, &err.to_string()),
        }
    }
}

/// One line per level, marked done, current or locked.
pub fn level_select_lines(tracker: &ProgressTracker, curriculum: &Curriculum) -> Vec<String> {
    curriculum
        .levels()
        .iter()
        .map(|def| {
            let status = level_status(def.number, tracker.unlocked_level());
            let (mark, suffix) = match status {
                LevelStatus::Completed => ("[done]", ""),
                LevelStatus::Current => ("[ >> ]", ""),
                LevelStatus::Locked => ("[lock]", " (locked)"),
            };
            format!(
                "{mark} {}. Level {}: {}{suffix} - {}",
                def.number, def.number, def.name, def.summary
            )
        })
        .collect()
}

fn progress_screen<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
) {
    session.say(Tone::Banner, "YOUR PROGRESS");
    for line in progress_report(session.tracker(), curriculum) {
        session.say(Tone::Story, &line);
    }
}

/// Progress summary: XP against the curriculum total, level, achievements.
pub fn progress_report(tracker: &ProgressTracker, curriculum: &Curriculum) -> Vec<String> {
    let total = curriculum.total_points();
    let xp = tracker.experience_points();
    let percent = if total == 0 {
        0
    } else {
        (xp.saturating_mul(100) / total).min(100)
    };
    let filled = PROGRESS_BAR_WIDTH * percent / 100;
    let bar = format!(
        "{}{}",
        "#".repeat(usize::try_from(filled).unwrap_or(0)),
        "-".repeat(usize::try_from(PROGRESS_BAR_WIDTH - filled).unwrap_or(0))
    );

    let level_line = if tracker.all_complete() {
        format!("Level: all {} complete", tracker.level_count())
    } else {
        format!(
            "Level: {} / {}",
            tracker.unlocked_level(),
            tracker.level_count()
        )
    };

    let mut lines = vec![
        format!("XP: {xp} / {total}  [{bar}] {percent}%"),
        level_line,
        format!(
            "Achievements: {} / {}",
            tracker.achievements().len(),
            achievement_total(curriculum)
        ),
    ];
    if tracker.achievements().is_empty() {
        lines.push("No achievements yet. Start playing!".to_string());
    } else {
        lines.extend(tracker.achievements().iter().map(|name| format!("  * {name}")));
    }
    lines
}

/// Step achievements plus the one granted at victory.
fn achievement_total(curriculum: &Curriculum) -> usize {
    let names = curriculum.achievement_names();
    if names.contains(&FINAL_ACHIEVEMENT) {
        names.len()
    } else {
        names.len() + 1
    }
}
