//! Level 6: team workflow with a scripted teammate.

use anyhow::Result;

use crate::core::matcher::{IntentRule, tokenize};
use crate::core::types::Reward;
use crate::io::console::Tone;
use crate::lab::{Action, LabScript, LabStep, StepContext};

use super::{
    add_step, checkout_trunk_quiet, checkout_trunk_step, commit_step, echo_step, level_complete,
};

const FEATURE_BRANCH: &str = "feature/add-inventory";
const TEAMMATE_BRANCH: &str = "feature/sarah-logging";

pub(super) fn level_6(trunk: &str) -> Vec<LabScript> {
    let naming = LabScript::new(
        "LEVEL 6 - LAB 1: BRANCH NAMING CONVENTIONS",
        "Name branches and commits the way teams do.",
    )
    .story("feature/ for new work, fix/ for bugs, hotfix/ for emergencies.")
    .story("Commit messages start with a type: feat:, fix:, docs:, test:.")
    .step(
        LabStep::new(
            "Create a properly named feature branch:",
            IntentRule::command(format!("git checkout -b {FEATURE_BRANCH}"))
                .phrase("checkout")
                .flag("-b")
                .mention("feature/"),
        )
        .then(Action::git(["checkout", "-b", FEATURE_BRANCH]))
        .reward(Reward::points(30, "Branch naming conventions")),
    )
    .step(echo_step(
        "inventory.txt",
        "Inventory: Sword, Shield, Potion\n",
        "inventory",
    ))
    .step(add_step("inventory.txt"))
    .step(
        commit_step("feat: add inventory system")
            .reward(Reward::points(20, "Conventional commit")),
    );

    let teammates = LabScript::new(
        "LEVEL 6 - LAB 2: WORKING WITH TEAMMATES",
        "See what happens while you're away.",
    )
    .step(
        checkout_trunk_step(trunk)
            .then(Action::write(
                "api.txt",
                "API Module - handles HTTP requests\nEndpoint: /users GET\nEndpoint: /login POST\n",
            ))
            .then(Action::quiet(["add", "api.txt"]))
            .then(Action::quiet(["commit", "-m", "feat: add API module (by Sarah)"]))
            .then(Action::write(
                "database.txt",
                "Database: PostgreSQL\nTable: users (id, name, email)\nTable: sessions (id, user_id, token)\n",
            ))
            .then(Action::quiet(["add", "database.txt"]))
            .then(Action::quiet([
                "commit",
                "-m",
                "feat: add database schema (by Sarah)",
            ]))
            .then(Action::say(&format!("Sarah just landed two commits on {trunk}!"))),
    )
    .step(
        LabStep::new(
            "See what she did:",
            IntentRule::command("git log --oneline -5").phrase("log"),
        )
        .then(Action::git(["log", "--oneline", "-5"])),
    )
    .step(
        LabStep::new(
            "Go back to your feature:",
            IntentRule::command(format!("git checkout {FEATURE_BRANCH}"))
                .any_of(&["checkout", "switch"])
                .mention("feature"),
        )
        .then(Action::quiet(["checkout", FEATURE_BRANCH]))
        .then(Action::say(&format!(
            "Your branch doesn't have Sarah's work yet. It fell behind {trunk}."
        )))
        .reward(Reward::points(30, "Team simulation")),
    );

    let sync = LabScript::new(
        "LEVEL 6 - LAB 3: STAYING UP TO DATE",
        &format!("Bring {trunk} into your feature branch."),
    )
    .step(
        LabStep::new(
            &format!("Merge {trunk} into your branch:"),
            IntentRule::command(format!("git merge {trunk}"))
                .phrase("merge")
                .mention(trunk),
        )
        .then(Action::Custom(merge_trunk))
        .reward(Reward::points(40, "Branch sync mastered")),
    )
    .step(
        LabStep::new(
            "See both lines of work joined:",
            IntentRule::command("git log --oneline --graph -6").phrase("log"),
        )
        .then(Action::git(["log", "--oneline", "--graph", "-6"])),
    );

    let blame = LabScript::new(
        "LEVEL 6 - LAB 4: GIT BLAME - WHO WROTE THIS?",
        "Find out who wrote each line.",
    )
    .step(
        LabStep::new(
            "Investigate api.txt:",
            IntentRule::command("git blame api.txt").phrase("blame"),
        )
        .then(Action::git(["blame", "api.txt"]))
        .then(Action::say("Every line shows the commit, author and date."))
        .reward(Reward::points(30, "Git blame mastered").with_achievement("Detective")),
    );

    let cherry_pick = LabScript::new(
        "LEVEL 6 - LAB 5: CHERRY-PICK - STEAL ONE COMMIT",
        &format!("Copy one urgent fix onto {trunk} without the unfinished work."),
    )
    .story("Sarah's logging branch has a critical security fix sitting between unfinished commits.")
    .setup(Action::Custom(prepare_cherry_pick))
    .step(
        LabStep::new(
            "Look at her branch:",
            IntentRule::command("git log --oneline -3").phrase("log"),
        )
        .then(Action::git(["log", "--oneline", "-3"]))
        .then(Action::say(
            "The middle commit 'fix: patch XSS vulnerability' is the one we need.",
        )),
    )
    .step(checkout_trunk_step(trunk))
    .step(
        LabStep::new(
            "Cherry-pick the fix (use its hash from the log):",
            IntentRule::command("git cherry-pick <fix hash>").phrase("cherry-pick"),
        )
        .then(Action::Custom(cherry_pick_fix))
        .then(Action::quiet(["branch", "-D", TEAMMATE_BRANCH]))
        .reward(Reward::points(50, "Cherry-pick mastered")),
    )
    .step(level_complete(
        "LEVEL 6 COMPLETE! You learned naming conventions, syncing with merge, blame and cherry-pick.",
        Reward::none().with_achievement("Team Player"),
    ));

    vec![naming, teammates, sync, blame, cherry_pick]
}

fn merge_trunk(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let trunk = ctx.config().default_branch.clone();
    let out = ctx.git(&["merge", &trunk, "--no-edit"]);
    if out.succeeded {
        ctx.say(Tone::Success, "Your branch now has Sarah's work AND yours.");
    }
    Ok(())
}

/// Land the feature on trunk and build Sarah's three-commit branch.
fn prepare_cherry_pick(input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    checkout_trunk_quiet(input, ctx)?;
    ctx.git_quiet(&["merge", FEATURE_BRANCH, "--no-edit"]);
    ctx.git_quiet(&["branch", "-d", FEATURE_BRANCH]);
    ctx.git_quiet(&["checkout", "-b", TEAMMATE_BRANCH]);

    for (path, content, message) in [
        (
            "logging.txt",
            "Logger: console output\nLevel: INFO\n",
            "feat: add logging module",
        ),
        (
            "security-patch.txt",
            "CRITICAL FIX: patch XSS vulnerability in login form\n",
            "fix: patch XSS vulnerability",
        ),
        (
            "experimental.txt",
            "Experimental feature - WIP do not merge\n",
            "wip: experimental feature (not ready)",
        ),
    ] {
        ctx.workspace().write_text(path, content)?;
        ctx.git_quiet(&["add", path]);
        ctx.git_quiet(&["commit", "-m", message]);
    }
    Ok(())
}

/// Pick the hash the learner typed; fall back to the fix commit if that fails.
fn cherry_pick_fix(input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let fix = ctx.repo().short_hash(&format!("{TEAMMATE_BRANCH}~1"));
    let typed = tokenize(input, true)
        .into_iter()
        .skip_while(|token| !token.eq_ignore_ascii_case("cherry-pick"))
        .nth(1);

    if let Some(hash) = typed {
        let out = ctx.git(&["cherry-pick", &hash]);
        if out.succeeded {
            ctx.say(Tone::Success, "Cherry-picked! Only that commit came over.");
            return Ok(());
        }
        if ctx.repo().has_conflict() {
            ctx.git_quiet(&["cherry-pick", "--abort"]);
        }
    }

    let Some(fix) = fix else {
        ctx.say(Tone::Failure, "Could not find the fix commit on Sarah's branch.");
        return Ok(());
    };
    ctx.say(Tone::Story, &format!("Picking the fix commit {fix} for you."));
    let out = ctx.git(&["cherry-pick", &fix]);
    if out.succeeded {
        ctx.say(Tone::Success, "Cherry-picked! Only the security fix came over.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::matches;
    use crate::io::backend::BackendOutput;
    use crate::io::config::QuestConfig;
    use crate::io::workspace::Workspace;
    use crate::test_support::{RecordingBackend, ScriptedConsole};

    #[test]
    fn feature_branch_must_follow_the_convention() {
        let scripts = level_6("main");
        let rule = &scripts[0].steps[0].rule;
        assert!(matches("git checkout -b feature/add-inventory", rule));
        assert!(!matches("git checkout -b inventory", rule));
    }

    #[test]
    fn cherry_pick_falls_back_to_fix_commit() {
        let backend = RecordingBackend::new();
        backend.respond("rev-parse", BackendOutput::ok("abc1234"));
        backend.respond(
            "cherry-pick",
            BackendOutput::failed("fatal: bad revision 'zzz'"),
        );
        backend.respond(
            "cherry-pick",
            BackendOutput::ok("[main 9f9f9f9] fix: patch XSS vulnerability"),
        );
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let config = QuestConfig::default();
        let workspace = Workspace::new("/scratch/git-quest");
        let mut ctx = StepContext::new(&workspace, &backend, &config, &mut console);

        cherry_pick_fix("git cherry-pick zzz", &mut ctx).expect("pick");

        let picks: Vec<Vec<String>> = backend
            .calls()
            .into_iter()
            .filter(|call| call.operation == "cherry-pick")
            .map(|call| call.args)
            .collect();
        assert_eq!(picks, vec![vec!["zzz".to_string()], vec!["abc1234".to_string()]]);
    }
}
