//! Levels 3 and 4: branches, the merge-conflict boss, and remotes.

use anyhow::Result;

use crate::core::matcher::IntentRule;
use crate::core::types::Reward;
use crate::io::console::Tone;
use crate::lab::{Action, LabScript, LabStep, StepContext};

use super::{add_step, checkout_trunk_step, commit_step, echo_step, new_branch_step};

/// Sibling directory holding the bare "cloud" repository.
pub(crate) const CLOUD_SUFFIX: &str = "cloud";
/// Sibling directory holding the scripted teammate's clone.
pub(crate) const TEAMMATE_SUFFIX: &str = "teammate";

pub(super) fn level_3(trunk: &str) -> Vec<LabScript> {
    let first_branch = LabScript::new(
        "LEVEL 3 - LAB 1: YOUR FIRST BRANCH",
        "Create a new branch and switch to it.",
    )
    .story("A branch is a parallel universe for your code.")
    .step(
        LabStep::new(
            "See which branches exist:",
            IntentRule::command("git branch")
                .phrase("git branch")
                .forbid("checkout")
                .forbid_flag("-b"),
        )
        .then(Action::git(["branch"]))
        .then(Action::say("The * marks the branch you're on.")),
    )
    .step(
        new_branch_step("Create a branch and switch to it:", "add-weapons")
            .then(Action::say("You are now in the add-weapons universe!"))
            .reward(Reward::points(20, "First branch created")),
    );

    let isolation = LabScript::new(
        "LEVEL 3 - LAB 2: PROOF THAT BRANCHES ARE SEPARATE",
        &format!("Add a file on this branch, then watch it DISAPPEAR on {trunk}."),
    )
    .step(echo_step("weapons.txt", "Sword of Truth - 50 damage\n", "weapon"))
    .step(add_step("weapons.txt"))
    .step(commit_step("Add Sword of Truth"))
    .step(checkout_trunk_step(trunk).then(Action::Custom(report_weapons)))
    .step(
        LabStep::new(
            "Jump back to the weapons branch:",
            IntentRule::command("git checkout add-weapons")
                .any_of(&["checkout", "switch"])
                .mention("add-weapons"),
        )
        .then(Action::quiet(["checkout", "add-weapons"]))
        .then(Action::Custom(report_weapons))
        .reward(Reward::points(40, "Branch isolation proven")),
    );

    let first_merge = LabScript::new(
        "LEVEL 3 - LAB 3: YOUR FIRST MERGE",
        &format!("Bring weapons into {trunk}."),
    )
    .step(checkout_trunk_step(trunk))
    .step(
        LabStep::new(
            "Merge the weapons branch in:",
            IntentRule::command("git merge add-weapons").phrase("merge"),
        )
        .then(Action::git(["merge", "add-weapons"]))
        .then(Action::say("Merged! The sword is now part of your main story."))
        .reward(Reward::points(40, "First merge!")),
    )
    .step(
        LabStep::new(
            "Clean up the merged branch:",
            IntentRule::command("git branch -d add-weapons")
                .phrase("branch")
                .flag("-d"),
        )
        .then(Action::git(["branch", "-d", "add-weapons"])),
    )
    .step(
        LabStep::new(
            "Admire the timeline:",
            IntentRule::command("git log --oneline --graph --all").phrase("log"),
        )
        .then(Action::git(["log", "--oneline", "--graph", "--all"])),
    );

    let trap = LabScript::new(
        "BOSS FIGHT - STEP 1: SET THE TRAP",
        "Create conflicting changes on two branches.",
    )
    .story("Two branches will change the SAME line of hero.txt. Git won't know which one to keep.")
    .step(new_branch_step("Create the fire branch:", "fire-upgrade"))
    .step(echo_step("hero.txt", "Hero Class: Fire Knight\n", "hero"))
    .step(add_step("hero.txt"))
    .step(
        LabStep::new(
            "Commit the fire upgrade:",
            IntentRule::command("git commit -m \"Upgrade hero to Fire Knight\"").phrase("commit"),
        )
        .then(Action::git(["commit", "-m", "Upgrade hero to Fire Knight"])),
    )
    .step(checkout_trunk_step(trunk))
    .step(echo_step("hero.txt", "Hero Class: Ice Wizard\n", "hero"))
    .step(add_step("hero.txt"))
    .step(
        LabStep::new(
            "Commit the ice upgrade:",
            IntentRule::command("git commit -m \"Upgrade hero to Ice Wizard\"").phrase("commit"),
        )
        .then(Action::git(["commit", "-m", "Upgrade hero to Ice Wizard"])),
    );

    let trigger = LabScript::new(
        "BOSS FIGHT - STEP 2: TRIGGER THE CONFLICT",
        "Merge the fire branch and face the boss.",
    )
    .step(
        LabStep::new(
            "Merge fire-upgrade:",
            IntentRule::command("git merge fire-upgrade").phrase("merge"),
        )
        .then(Action::Custom(merge_into_conflict)),
    );

    let resolve = LabScript::new(
        "BOSS FIGHT - STEP 3: RESOLVE IT",
        "Pick the final version of hero.txt and finish the merge.",
    )
    .step(
        LabStep::new(
            "Look inside the conflicted file:",
            IntentRule::command("cat hero.txt").mention("hero"),
        )
        .then(Action::show("hero.txt")),
    )
    .step(LabStep::pause(
        "Git marked both versions. To resolve, replace the whole file with the version you want.",
    ))
    .step(echo_step("hero.txt", "Hero Class: Fire-Ice Battle Mage\n", "hero"))
    .step(add_step("hero.txt"))
    .step(
        LabStep::new(
            "Seal the merge:",
            IntentRule::command("git commit -m \"Merge: combine fire and ice into Battle Mage\"")
                .phrase("commit"),
        )
        .then(Action::commit(
            ["commit"],
            "Merge: combine fire and ice into Battle Mage",
        ))
        .then(Action::quiet(["branch", "-d", "fire-upgrade"]))
        .then(Action::say("BOSS DEFEATED! The conflict is resolved."))
        .reward(
            Reward::points(100, "MERGE CONFLICT BOSS DEFEATED!")
                .with_achievement("Conflict Resolver"),
        ),
    )
    .step(
        LabStep::pause(
            "LEVEL 3 COMPLETE! You learned branch, checkout -b, merge, branch -d and conflict resolution.",
        )
        .reward(Reward::none().with_achievement("Branch Master")),
    );

    vec![first_branch, isolation, first_merge, trap, trigger, resolve]
}

pub(super) fn level_4(trunk: &str) -> Vec<LabScript> {
    let connect = LabScript::new(
        "LEVEL 4 - LAB 1: CONNECT TO THE CLOUD",
        "Link your quest to a remote and push it.",
    )
    .story("A remote is a copy of your repository that lives somewhere else, like GitHub.")
    .story("Here the cloud kingdom is a folder next to your quest, so no account is needed.")
    .setup(Action::Custom(raise_cloud))
    .step(
        LabStep::new(
            "Connect your repo to the cloud (the path is filled in for you):",
            IntentRule::command("git remote add origin <cloud path>").phrase("remote add"),
        )
        .then(Action::Custom(add_origin))
        .reward(Reward::points(50, "Remote connected")),
    )
    .step(
        LabStep::new(
            "Check the connection:",
            IntentRule::command("git remote -v").phrase("remote").flag("-v"),
        )
        .then(Action::git(["remote", "-v"])),
    )
    .step(
        LabStep::new(
            "Push your work to the cloud:",
            IntentRule::command(format!("git push -u origin {trunk}")).phrase("push"),
        )
        .then(Action::Custom(push_trunk))
        .reward(Reward::points(100, "Pushed to the cloud!").with_achievement("Cloud Warrior")),
    );

    let daily = LabScript::new(
        "LEVEL 4 - LAB 2: THE DAILY WORKFLOW",
        "Pull in what your teammate pushed.",
    )
    .story("Your teammate cloned the cloud, wrote a quest log and pushed it.")
    .story("Daily routine: pull, work, add, commit, push.")
    .setup(Action::Custom(teammate_pushes))
    .step(
        LabStep::new("Download their work:", IntentRule::command("git pull").phrase("pull"))
            .then(Action::git(["pull"]))
            .reward(Reward::points(50, "Teammate's work pulled")),
    )
    .step(
        LabStep::new(
            "See their commit in your history:",
            IntentRule::command("git log --oneline").phrase("log"),
        )
        .then(Action::git(["log", "--oneline", "-3"])),
    )
    .step(
        LabStep::pause("LEVEL 4 COMPLETE! You learned remote add, push -u and pull.")
            .reward(Reward::points(100, "Cloud Kingdom concepts mastered")),
    );

    vec![connect, daily]
}

fn report_weapons(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    if ctx.workspace().exists("weapons.txt") {
        ctx.say(Tone::Success, "weapons.txt is here! It lives on this branch.");
    } else {
        ctx.say(
            Tone::Success,
            "weapons.txt has VANISHED! It only exists on add-weapons.",
        );
    }
    Ok(())
}

fn merge_into_conflict(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let out = ctx.git(&["merge", "fire-upgrade"]);
    if out.reports_conflict() {
        ctx.say(
            Tone::Failure,
            "CONFLICT DETECTED! Both branches changed the same line of hero.txt.",
        );
    } else if out.succeeded {
        ctx.say(Tone::Story, "The branches merged cleanly this time.");
    }
    Ok(())
}

/// Create a fresh bare repository beside the workspace and drop any stale origin.
fn raise_cloud(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let cloud = ctx.workspace().sibling(CLOUD_SUFFIX);
    cloud.wipe()?;
    cloud.ensure_root()?;
    let branch = format!("--initial-branch={}", ctx.config().default_branch);
    ctx.git_in(cloud.root(), &["init", "--bare", &branch], false);

    let remotes = ctx.git_quiet(&["remote"]);
    if remotes.output.lines().any(|name| name.trim() == "origin") {
        ctx.git_quiet(&["remote", "remove", "origin"]);
    }
    Ok(())
}

fn add_origin(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let cloud = ctx.workspace().sibling(CLOUD_SUFFIX);
    let path = cloud.root().display().to_string();
    let out = ctx.git(&["remote", "add", "origin", &path]);
    if out.succeeded {
        ctx.say(Tone::Success, &format!("origin now points at {path}"));
    }
    Ok(())
}

fn push_trunk(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let trunk = ctx.config().default_branch.clone();
    let out = ctx.git(&["push", "-u", "origin", &trunk]);
    if out.succeeded {
        ctx.say(Tone::Success, "Your quest is safe in the cloud!");
    }
    Ok(())
}

/// Clone the cloud as a teammate, commit a file there and push it.
fn teammate_pushes(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let cloud = ctx.workspace().sibling(CLOUD_SUFFIX);
    let teammate = ctx.workspace().sibling(TEAMMATE_SUFFIX);
    teammate.wipe()?;

    let cloud_path = cloud.root().display().to_string();
    let teammate_path = teammate.root().display().to_string();
    ctx.git_quiet(&["clone", &cloud_path, &teammate_path]);

    teammate.write_text("quest-log.txt", "Teammate: found the dragon's lair\n")?;
    ctx.git_in(teammate.root(), &["add", "quest-log.txt"], false);
    ctx.git_in(
        teammate.root(),
        &["commit", "-m", "Add quest log (by teammate)"],
        false,
    );
    ctx.git_in(teammate.root(), &["push", "origin", "HEAD"], false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::matches;

    #[test]
    fn level_3_has_the_boss_scripts_in_order() {
        let titles: Vec<String> = level_3("main")
            .into_iter()
            .map(|script| script.title)
            .collect();
        assert_eq!(titles.len(), 6);
        assert!(titles[3].contains("SET THE TRAP"));
        assert!(titles[4].contains("TRIGGER"));
        assert!(titles[5].contains("RESOLVE"));
    }

    #[test]
    fn branch_listing_rejects_branch_creation() {
        let scripts = level_3("main");
        let rule = &scripts[0].steps[0].rule;
        assert!(matches("git branch", rule));
        assert!(!matches("git checkout -b add-weapons", rule));
    }

    #[test]
    fn level_4_totals_three_hundred() {
        let points: u64 = level_4("main").iter().map(LabScript::points).sum();
        assert_eq!(points, 300);
    }
}
