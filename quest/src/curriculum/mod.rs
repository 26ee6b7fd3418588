//! The eight-level curriculum, expressed as lab scripts.
//!
//! Levels are plain data built on demand. Each builder receives the trunk
//! branch name so commands and hints match the repository the learner has.

use anyhow::Result;

use crate::core::matcher::{IntentRule, tokenize};
use crate::core::types::Reward;
use crate::lab::{Action, LabScript, LabStep, StepContext};

mod basics;
mod branching;
mod recovery;
mod release;
mod team;

/// Builds a level's scripts for the given trunk branch.
pub type LevelBuilder = fn(&str) -> Vec<LabScript>;

/// Branch name used when only static facts (points, achievements) are needed.
const REFERENCE_TRUNK: &str = "main";

#[derive(Clone)]
pub struct LevelDef {
    pub number: u32,
    pub name: &'static str,
    pub summary: &'static str,
    pub build: LevelBuilder,
}

/// Ordered, 1-indexed list of levels.
#[derive(Clone)]
pub struct Curriculum {
    levels: Vec<LevelDef>,
}

impl Curriculum {
    pub fn new(levels: Vec<LevelDef>) -> Self {
        Self { levels }
    }

    pub fn level_count(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    pub fn get(&self, level: u32) -> Option<&LevelDef> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }

    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    /// Points available across every level.
    pub fn total_points(&self) -> u64 {
        self.levels
            .iter()
            .flat_map(|level| (level.build)(REFERENCE_TRUNK))
            .map(|script| script.points())
            .sum()
    }

    /// Every achievement a step can grant, in curriculum order.
    pub fn achievement_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for script in self
            .levels
            .iter()
            .flat_map(|level| (level.build)(REFERENCE_TRUNK))
        {
            for name in script.steps.iter().filter_map(|step| step.reward.achievement) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }
}

/// The full Git Quest curriculum.
pub fn curriculum() -> Curriculum {
    Curriculum::new(vec![
        LevelDef {
            number: 1,
            name: "The Awakening",
            summary: "Register your identity, create a repository and make your first commits.",
            build: basics::level_1,
        },
        LevelDef {
            number: 2,
            name: "First Blood",
            summary: "Stage many files at once and learn the undo spells.",
            build: basics::level_2,
        },
        LevelDef {
            number: 3,
            name: "The Multiverse",
            summary: "Branch, merge, and defeat the merge conflict boss.",
            build: branching::level_3,
        },
        LevelDef {
            number: 4,
            name: "The Cloud Kingdom",
            summary: "Connect to a remote, push your work and pull a teammate's.",
            build: branching::level_4,
        },
        LevelDef {
            number: 5,
            name: "The Final Boss",
            summary: "Stash, recover deleted work, undo commits and read the reflog.",
            build: recovery::level_5,
        },
        LevelDef {
            number: 6,
            name: "The Guild",
            summary: "Work like a team: naming conventions, syncing, blame and cherry-pick.",
            build: team::level_6,
        },
        LevelDef {
            number: 7,
            name: "The War Room",
            summary: "Squash messy history, bisect a bug and review changes.",
            build: release::level_7,
        },
        LevelDef {
            number: 8,
            name: "The Throne Room",
            summary: "Tag releases, ship a hotfix and run a full sprint.",
            build: release::level_8,
        },
    ])
}

/// Run the learner's own command line (minus the leading `git`).
pub(crate) fn run_typed(input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let tokens = tokenize(input, true);
    let args: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .skip_while(|token| token.eq_ignore_ascii_case("git"))
        .collect();
    ctx.git(&args);
    Ok(())
}

/// Switch to the configured trunk branch.
pub(crate) fn checkout_trunk(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let trunk = ctx.config().default_branch.clone();
    ctx.git(&["checkout", &trunk]);
    Ok(())
}

/// Quietly switch to the configured trunk branch.
pub(crate) fn checkout_trunk_quiet(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let trunk = ctx.config().default_branch.clone();
    ctx.git_quiet(&["checkout", &trunk]);
    Ok(())
}

/// `echo "<content>" > path`, accepted when the input mentions `keyword`.
pub(crate) fn echo_step(path: &str, content: &str, keyword: &str) -> LabStep {
    let shown = content.lines().next().unwrap_or(content);
    LabStep::new(
        &format!("Create {path}:"),
        IntentRule::command(format!("echo \"{shown}\" > {path}")).mention(keyword),
    )
    .then(Action::write(path, content))
    .then(Action::say(&format!("{path} written!")))
}

pub(crate) fn status_step(narration: &str) -> LabStep {
    LabStep::new(
        narration,
        IntentRule::command("git status").phrase("git status"),
    )
    .then(Action::git(["status"]))
}

pub(crate) fn add_step(path: &str) -> LabStep {
    LabStep::new(
        "Stage it:",
        IntentRule::command(format!("git add {path}")).phrase("git add"),
    )
    .then(Action::quiet(["add", path]))
    .then(Action::say("Staged!"))
}

/// `git commit -m "<message>"`; the learner's own message wins when given.
pub(crate) fn commit_step(message: &str) -> LabStep {
    LabStep::new(
        "Commit it:",
        IntentRule::command(format!("git commit -m \"{message}\"")).phrase("commit"),
    )
    .then(Action::commit(["commit"], message))
}

pub(crate) fn checkout_trunk_step(trunk: &str) -> LabStep {
    LabStep::new(
        &format!("Switch back to {trunk}:"),
        IntentRule::command(format!("git checkout {trunk}"))
            .any_of(&["checkout", "switch"])
            .mention(trunk),
    )
    .then(Action::Custom(checkout_trunk))
}

pub(crate) fn new_branch_step(narration: &str, branch: &str) -> LabStep {
    LabStep::new(
        narration,
        IntentRule::command(format!("git checkout -b {branch}"))
            .phrase("checkout")
            .flag("-b"),
    )
    .then(Action::git(["checkout", "-b", branch]))
}

/// A level-complete pause that grants the closing reward.
pub(crate) fn level_complete(lessons: &str, reward: Reward) -> LabStep {
    LabStep::pause(lessons).reward(reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::matches;
    use crate::io::config::QuestConfig;
    use crate::io::workspace::Workspace;
    use crate::test_support::{RecordingBackend, ScriptedConsole};

    #[test]
    fn curriculum_has_eight_numbered_levels() {
        let curriculum = curriculum();
        assert_eq!(curriculum.level_count(), 8);
        for (index, level) in curriculum.levels().iter().enumerate() {
            assert_eq!(level.number as usize, index + 1);
            assert!(!(level.build)("main").is_empty(), "level {} is empty", level.number);
        }
        assert!(curriculum.get(0).is_none());
        assert!(curriculum.get(9).is_none());
        assert_eq!(curriculum.get(3).map(|level| level.name), Some("The Multiverse"));
    }

    #[test]
    fn every_step_hint_satisfies_its_own_rule() {
        for level in curriculum().levels() {
            for script in (level.build)("main") {
                for step in &script.steps {
                    let canonical = step.rule.canonical();
                    if canonical.contains('<') {
                        continue;
                    }
                    assert!(
                        matches(canonical, &step.rule),
                        "level {} / {}: canonical '{canonical}' is rejected by its own rule",
                        level.number,
                        script.title,
                    );
                }
            }
        }
    }

    #[test]
    fn achievements_are_distinct_and_reachable() {
        let names = curriculum().achievement_names();
        for expected in [
            "First Commit",
            "Time Traveler",
            "Conflict Resolver",
            "Branch Master",
            "Cloud Warrior",
            "Rescue Ranger",
            "Detective",
            "Team Player",
            "Clean Coder",
            "Bug Hunter",
            "Firefighter",
            "Release Manager",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn total_points_is_positive_and_stable() {
        let curriculum = curriculum();
        let total = curriculum.total_points();
        assert!(total > 0);
        assert_eq!(total, curriculum.total_points());
    }

    #[test]
    fn trunk_name_flows_into_commands() {
        let scripts = branching::level_3("trunk");
        let mentions_trunk = scripts
            .iter()
            .flat_map(|script| &script.steps)
            .any(|step| step.rule.canonical() == "git checkout trunk");
        assert!(mentions_trunk);
    }

    #[test]
    fn run_typed_strips_leading_git() {
        let backend = RecordingBackend::new();
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let config = QuestConfig::default();
        let workspace = Workspace::new("/scratch/git-quest");
        let mut ctx = StepContext::new(&workspace, &backend, &config, &mut console);

        run_typed("GIT config --global user.name \"Ada L\"", &mut ctx).expect("run");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation, "config");
        assert_eq!(calls[0].args, vec!["--global", "user.name", "Ada L"]);
    }
}
