//! Level runs, resume bootstrap and the victory sequence.

use anyhow::{Result, anyhow};
use tracing::{info, instrument, warn};

use crate::core::types::{Flow, LevelOutcome, Reward};
use crate::curriculum::Curriculum;
use crate::io::backend::VcsBackend;
use crate::io::console::{Console, Tone};
use crate::io::save_store::ProgressStore;
use crate::lab::run_script;
use crate::session::Session;

/// Baseline file written by the resume bootstrap.
pub const BOOTSTRAP_FILE: &str = "hero.txt";
pub const BOOTSTRAP_CONTENT: &str = "Hero - Git Quest Player\n";
pub const BOOTSTRAP_MESSAGE: &str = "Quest checkpoint";

/// Granted once the final level is complete.
pub const FINAL_ACHIEVEMENT: &str = "Git Master";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The workspace already held a repository; nothing was touched.
    AlreadyPresent,
    Created,
    /// A bootstrap operation failed; carries the diagnostic text.
    Failed(String),
}

/// Make sure a resumed level has a repository to work in.
///
/// Creates the workspace root, and when no repository exists initializes one
/// with the configured default branch and a single committed baseline file.
#[instrument(skip_all, fields(root = %session.workspace().root().display()))]
pub fn bootstrap_if_missing<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
) -> BootstrapOutcome {
    if let Err(err) = session.workspace().ensure_root() {
        return BootstrapOutcome::Failed(format!("{err:#}"));
    }
    if session.workspace().has_vcs_root() {
        return BootstrapOutcome::AlreadyPresent;
    }

    info!("bootstrapping workspace repository");
    let branch = format!("--initial-branch={}", session.config().default_branch);
    let init = session.git(&["init", &branch]);
    if !init.succeeded {
        return BootstrapOutcome::Failed(init.output);
    }
    if let Err(err) = session
        .workspace()
        .write_text(BOOTSTRAP_FILE, BOOTSTRAP_CONTENT)
    {
        return BootstrapOutcome::Failed(format!("{err:#}"));
    }
    for args in [
        &["add", "."][..],
        &["commit", "-m", BOOTSTRAP_MESSAGE][..],
    ] {
        let out = session.git(args);
        if !out.succeeded {
            return BootstrapOutcome::Failed(out.output);
        }
    }
    BootstrapOutcome::Created
}

/// Level 1 only needs the directory; later levels need a repository too.
fn prepare_workspace<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    level: u32,
) {
    if level <= 1 {
        if let Err(err) = session.workspace().ensure_root() {
            session.say(Tone::Failure, &format!("Could not create the workspace: {err:#}"));
        }
        return;
    }
    match bootstrap_if_missing(session) {
        BootstrapOutcome::AlreadyPresent => {}
        BootstrapOutcome::Created => session.say(
            Tone::Story,
            "No quest repository found, so a fresh one was set up for you.",
        ),
        BootstrapOutcome::Failed(output) => {
            warn!(level = level, "resume bootstrap failed");
            session.say(Tone::Failure, "Could not prepare the quest repository:");
            session.say(Tone::Output, &output);
        }
    }
}

/// Play one level. On completion the watermark rises past it and progress
/// is saved immediately; an abandoned level changes nothing durable.
#[instrument(skip_all, fields(level = level))]
pub fn run_level<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
    level: u32,
) -> Result<LevelOutcome> {
    let def = curriculum
        .get(level)
        .ok_or_else(|| anyhow!("no level {level} in the curriculum"))?;

    prepare_workspace(session, level);
    session.say(
        Tone::Banner,
        &format!("LEVEL {}: {}", def.number, def.name.to_uppercase()),
    );
    session.say(Tone::Story, def.summary);

    let trunk = session.config().default_branch.clone();
    for script in (def.build)(&trunk) {
        if run_script(session, &script)? == Flow::Abandoned {
            info!(level = level, "level abandoned");
            session.say(
                Tone::Story,
                "Quest paused. Progress from completed levels is safe.",
            );
            return Ok(LevelOutcome {
                level,
                flow: Flow::Abandoned,
                unlocked_level: session.tracker().unlocked_level(),
                persisted: false,
            });
        }
    }

    session.tracker_mut().raise_level(level + 1);
    let persisted = session.persist();
    session.say(
        Tone::Success,
        &format!(
            "LEVEL {level} COMPLETE! Total XP: {}",
            session.tracker().experience_points()
        ),
    );
    info!(level = level, persisted = persisted, "level complete");
    Ok(LevelOutcome {
        level,
        flow: Flow::Completed,
        unlocked_level: session.tracker().unlocked_level(),
        persisted,
    })
}

/// Play `start` and every level after it, then the victory sequence.
#[instrument(skip_all, fields(start = start))]
pub fn run_from<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
    start: u32,
) -> Result<Flow> {
    for level in start..=curriculum.level_count() {
        let outcome = run_level(session, curriculum, level)?;
        if outcome.flow == Flow::Abandoned {
            return Ok(Flow::Abandoned);
        }
    }
    victory(session, curriculum);
    Ok(Flow::Completed)
}

/// Celebrate finishing the curriculum and save the final state.
pub fn victory<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    curriculum: &Curriculum,
) {
    session.say(Tone::Banner, "VICTORY! YOU ARE A GIT MASTER!");
    session.grant(&Reward::none().with_achievement(FINAL_ACHIEVEMENT));
    let tracker = session.tracker();
    let score = format!(
        "Final score: {} / {} XP, {} achievements",
        tracker.experience_points(),
        curriculum.total_points(),
        tracker.achievements().len()
    );
    session.say(Tone::Reward, &score);
    session.persist();
}

/// The learner's current watermark.
pub fn unlocked_level<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &Session<B, S, C>,
) -> u32 {
    session.tracker().unlocked_level()
}
