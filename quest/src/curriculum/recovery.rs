//! Level 5: stash, recovery, reflog and aliases.

use anyhow::Result;

use crate::core::matcher::IntentRule;
use crate::core::types::Reward;
use crate::io::console::Tone;
use crate::lab::{Action, LabScript, LabStep, StepContext};

use super::{add_step, echo_step, level_complete, run_typed};

pub(super) fn level_5(_trunk: &str) -> Vec<LabScript> {
    let stash = LabScript::new(
        "LEVEL 5 - LAB 1: THE STASH SPELL",
        "Save work temporarily without committing.",
    )
    .story(
        "You're mid-quest when an urgent task appears. Stash hides your work in a pocket dimension.",
    )
    .step(echo_step("map.txt", "World Map - Forest Region\n", "map"))
    .step(
        LabStep::new(
            "Stash it away:",
            IntentRule::command("git stash").phrase("stash").forbid("pop"),
        )
        .then(Action::quiet(["add", "map.txt"]))
        .then(Action::git(["stash"]))
        .then(Action::say("map.txt vanished into the stash!")),
    )
    .step(
        LabStep::new(
            "Bring it back:",
            IntentRule::command("git stash pop").phrase("stash pop"),
        )
        .then(Action::git(["stash", "pop"]))
        .then(Action::say("Your work is back, exactly as you left it."))
        .then(Action::quiet(["add", "map.txt"]))
        .then(Action::quiet(["commit", "-m", "Add world map"]))
        .reward(Reward::points(50, "Stash spell mastered")),
    );

    let recovery = LabScript::new(
        "LEVEL 5 - LAB 2: EMERGENCY RECOVERY",
        "Recover from disasters.",
    )
    .step(
        LabStep::new(
            "Disaster strikes! Delete the warrior:",
            IntentRule::command("rm warrior.txt").any_of(&["rm", "del", "remove"]),
        )
        .then(Action::Remove("warrior.txt".to_string()))
        .then(Action::say("warrior.txt is gone from disk... but Git remembers.")),
    )
    .step(
        LabStep::new(
            "Restore it from the last commit:",
            IntentRule::command("git restore warrior.txt")
                .mention("restore")
                .mention("warrior"),
        )
        .then(Action::quiet(["restore", "warrior.txt"]))
        .then(Action::Custom(report_warrior))
        .reward(Reward::points(40, "File recovery mastered")),
    );

    let undo = LabScript::new(
        "LEVEL 5 - LAB 3: UNDO A BAD COMMIT",
        "Remove a commit you didn't want.",
    )
    .step(echo_step("oops.txt", "GARBAGE DATA\n", "oops"))
    .step(add_step("oops.txt"))
    .step(
        LabStep::new(
            "Commit the garbage (on purpose):",
            IntentRule::command("git commit -m \"Oops bad commit\"").phrase("commit"),
        )
        .then(Action::git(["commit", "-m", "Oops bad commit"])),
    )
    .step(
        LabStep::new(
            "Take it back:",
            IntentRule::command("git reset --soft HEAD~1").mention("reset"),
        )
        .then(Action::git(["reset", "--soft", "HEAD~1"]))
        .then(Action::quiet(["restore", "--staged", "oops.txt"]))
        .then(Action::Remove("oops.txt".to_string()))
        .then(Action::say("The bad commit is gone and the garbage is cleaned up."))
        .reward(Reward::points(40, "Commit recovery mastered")),
    );

    let reflog = LabScript::new(
        "LEVEL 5 - LAB 4: THE REFLOG - YOUR SAFETY NET",
        "See EVERYTHING that ever happened.",
    )
    .story("Even 'deleted' commits are recorded in the reflog for a while.")
    .step(
        LabStep::new("Open the reflog:", IntentRule::command("git reflog").phrase("reflog"))
            .then(Action::git(["reflog", "-10"]))
            .then(Action::say("Every move you made is listed. Nothing is truly lost."))
            .reward(Reward::points(40, "Reflog mastered").with_achievement("Rescue Ranger")),
    );

    let aliases = LabScript::new(
        "LEVEL 5 - LAB 5: POWER-UP - GIT ALIASES",
        "Create shortcuts for commands you use all the time.",
    )
    .step(
        LabStep::new(
            "Create a short alias for status:",
            IntentRule::command("git config --global alias.st status").mention("alias"),
        )
        .then(Action::git(["config", "--global", "alias.st", "status"]))
        .then(Action::say("Alias 'st' created!")),
    )
    .step(
        LabStep::new(
            "And a pretty log alias:",
            IntentRule::command("git config --global alias.lg \"log --oneline --graph --all\"")
                .mention("alias")
                .mention("lg"),
        )
        .then(Action::git([
            "config",
            "--global",
            "alias.lg",
            "log --oneline --graph --all",
        ]))
        .then(Action::say("Alias 'lg' created!")),
    )
    .step(
        LabStep::new(
            "Try one of them:",
            IntentRule::command("git st").any_of(&["git st", "git lg"]),
        )
        .then(Action::Custom(run_typed))
        .reward(Reward::points(30, "Aliases configured")),
    )
    .step(level_complete(
        "LEVEL 5 COMPLETE! Working dir -> staging -> commits, with stash, restore, reset and reflog as your safety nets.",
        Reward::points(100, "FINAL BOSS COMPLETE!"),
    ));

    vec![stash, recovery, undo, reflog, aliases]
}

fn report_warrior(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    if ctx.workspace().exists("warrior.txt") {
        ctx.say(Tone::Success, "warrior.txt is BACK from the dead!");
    } else {
        ctx.say(
            Tone::Failure,
            "warrior.txt could not be restored; it was never committed in this repository.",
        );
    }
    Ok(())
}
