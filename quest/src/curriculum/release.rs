//! Levels 7 and 8: history cleanup, bisect, review, tags and releases.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::core::matcher::{IntentRule, tokenize};
use crate::core::types::Reward;
use crate::io::backend::BackendOutput;
use crate::io::console::Tone;
use crate::lab::{Action, LabScript, LabStep, StepContext};

use super::{
    add_step, checkout_trunk_step, commit_step, echo_step, level_complete, new_branch_step,
};

static MINOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)v?1\.1(\.0)?(\s|$)").unwrap());

const RELEASE_TAGS: [&str; 4] = ["v1.0.0", "v1.1.0", "v1.1.1", "v2.0.0"];
const BISECT_LIMIT: usize = 10;

pub(super) fn level_7(trunk: &str) -> Vec<LabScript> {
    let squash = LabScript::new(
        "LEVEL 7 - LAB 1: SQUASH - CLEAN UP YOUR MESS",
        "Turn a pile of messy commits into one clean commit.",
    )
    .step(
        new_branch_step("Start a feature branch:", "feature/messy-work")
            .then(Action::Custom(messy_commits))
            .then(Action::git(["log", "--oneline", "-4"]))
            .then(Action::say("Four commits named 'wip' and 'idk'. Nobody wants to review that.")),
    )
    .step(checkout_trunk_step(trunk))
    .step(
        LabStep::new(
            "Squash all of it into staging:",
            IntentRule::command("git merge --squash feature/messy-work")
                .phrase("merge")
                .flag("--squash"),
        )
        .then(Action::git(["merge", "--squash", "feature/messy-work"])),
    )
    .step(
        commit_step("feat: add dashboard with charts, filters, and export")
            .then(Action::quiet(["branch", "-D", "feature/messy-work"]))
            .then(Action::say("Four messy commits became one clean one."))
            .reward(Reward::points(50, "Squash merge mastered").with_achievement("Clean Coder")),
    );

    let bisect = LabScript::new(
        "LEVEL 7 - LAB 2: GIT BISECT - HUNT THE BUG",
        "Find the commit that introduced a bug using binary search.",
    )
    .story("Six releases shipped. Somewhere along the way a BUG crept into app.txt.")
    .setup(Action::Custom(buggy_history))
    .setup(Action::git(["log", "--oneline", "-6"]))
    .step(
        LabStep::new(
            "Start the hunt:",
            IntentRule::command("git bisect start").phrase("bisect start"),
        )
        .then(Action::git(["bisect", "start"])),
    )
    .step(
        LabStep::new(
            "The current version is broken:",
            IntentRule::command("git bisect bad").phrase("bisect bad"),
        )
        .then(Action::git(["bisect", "bad"])),
    )
    .step(
        LabStep::new(
            "v1.0 worked. Mark it good (use its hash from the log):",
            IntentRule::command("git bisect good <v1.0 hash>").phrase("bisect good"),
        )
        .then(Action::Custom(bisect_hunt))
        .then(Action::quiet(["bisect", "reset"]))
        .reward(Reward::points(60, "Git bisect mastered").with_achievement("Bug Hunter")),
    );

    let review = LabScript::new(
        "LEVEL 7 - LAB 3: REVIEW DIFFS LIKE A PRO",
        "Read changes the way reviewers do.",
    )
    .setup(Action::write(
        "app.txt",
        "App v2.0 - Complete rewrite\nModules: auth, dashboard, api, database\nStatus: production ready\n",
    ))
    .setup(Action::quiet(["add", "app.txt"]))
    .setup(Action::quiet(["commit", "-m", "feat: complete app v2.0 rewrite"]))
    .step(
        LabStep::new(
            "Summarize the last change:",
            IntentRule::command("git diff --stat HEAD~1")
                .phrase("diff")
                .mention("stat"),
        )
        .then(Action::git(["diff", "--stat", "HEAD~1"]))
        .reward(Reward::points(30, "Diff stats mastered")),
    )
    .step(
        LabStep::new(
            "Inspect the commit:",
            IntentRule::command("git show --stat HEAD").phrase("show"),
        )
        .then(Action::git(["show", "--stat", "HEAD"]))
        .reward(Reward::points(20, "Git show mastered")),
    )
    .step(
        LabStep::new("Who contributed?", IntentRule::command("git shortlog -sn").phrase("shortlog"))
            .then(Action::git(["shortlog", "-sn", "HEAD"]))
            .reward(Reward::points(20, "Shortlog mastered")),
    );

    let range = format!("{trunk}..HEAD");
    let pull_request = LabScript::new(
        "LEVEL 7 - LAB 4: THE PERFECT PULL REQUEST",
        "Review your own branch before asking anyone else to.",
    )
    .step(
        new_branch_step("Start the feature:", "feature/user-notifications")
            .then(Action::Custom(notification_commits)),
    )
    .step(
        LabStep::new(
            &format!("Everything this branch changes versus {trunk}:"),
            IntentRule::command(format!("git diff {trunk} --stat"))
                .phrase("diff")
                .mention(trunk),
        )
        .then(Action::git(["diff", trunk, "--stat"]))
        .reward(Reward::points(30, "PR review skills")),
    )
    .step(
        LabStep::new(
            "Only the commits on this branch:",
            IntentRule::command(format!("git log {range} --oneline"))
                .phrase("log")
                .mention(trunk),
        )
        .then(Action::git(["log", range.as_str(), "--oneline"]))
        .then(Action::quiet(["checkout", trunk]))
        .then(Action::quiet(["merge", "feature/user-notifications", "--no-edit"]))
        .then(Action::quiet(["branch", "-d", "feature/user-notifications"]))
        .then(Action::say("Reviewed and merged. That's a clean pull request."))
        .reward(Reward::points(20, "Clean PR history")),
    )
    .step(LabStep::pause(
        "LEVEL 7 COMPLETE! You learned merge --squash, bisect, diff --stat, show, shortlog and PR review.",
    ));

    vec![squash, bisect, review, pull_request]
}

pub(super) fn level_8(trunk: &str) -> Vec<LabScript> {
    let tags = LabScript::new(
        "LEVEL 8 - LAB 1: GIT TAGS - MARKING RELEASES",
        "Mark releases with version tags.",
    )
    .story("MAJOR.MINOR.PATCH: breaking changes, new features, bug fixes.")
    .setup(Action::Custom(clear_release_tags))
    .step(
        LabStep::new(
            "Tag your first release:",
            IntentRule::command("git tag -a v1.0.0 -m \"Release v1.0.0: initial stable release\"")
                .phrase("tag"),
        )
        .then(Action::git([
            "tag",
            "-a",
            "v1.0.0",
            "-m",
            "Release v1.0.0: initial stable release",
        ]))
        .then(Action::say("v1.0.0 tagged!"))
        .reward(Reward::points(40, "First release tag")),
    )
    .step(
        LabStep::new("List your tags:", IntentRule::command("git tag").phrase("git tag"))
            .then(Action::git(["tag"]))
            .then(Action::write(
                "search.txt",
                "Search Module\n- Full-text search\n- Filters by date, type, author\n- Fuzzy matching\n",
            ))
            .then(Action::quiet(["add", "search.txt"]))
            .then(Action::quiet(["commit", "-m", "feat: add search module"]))
            .then(Action::say("A new search module just landed. Time for a minor release.")),
    )
    .step(
        LabStep::new(
            "Tag the minor release:",
            IntentRule::command("git tag -a v1.1.0 -m \"Release v1.1.0: add search module\"")
                .phrase("tag")
                .pattern(MINOR_TAG_RE.clone()),
        )
        .then(Action::git([
            "tag",
            "-a",
            "v1.1.0",
            "-m",
            "Release v1.1.0: add search module",
        ]))
        .reward(Reward::points(30, "Minor release tagged")),
    )
    .step(
        LabStep::new(
            "List tags with their messages:",
            IntentRule::command("git tag -n").phrase("tag").flag("-n"),
        )
        .then(Action::git(["tag", "-n"])),
    );

    let hotfix = LabScript::new(
        "LEVEL 8 - LAB 2: HOTFIX - EMERGENCY IN PRODUCTION!",
        "Ship an urgent fix without waiting for the next release.",
    )
    .story("ALERT: users can't log in! v1.1.0 crashes on a null session token.")
    .step(
        LabStep::new(
            "Branch off for the hotfix:",
            IntentRule::command("git checkout -b hotfix/login-crash")
                .phrase("checkout")
                .mention("hotfix"),
        )
        .then(Action::git(["checkout", "-b", "hotfix/login-crash"])),
    )
    .step(echo_step(
        "hotfix-patch.txt",
        "FIX: handle null session token in auth flow\nAffected: login, session refresh\nRoot cause: missing null check in token parser\n",
        "fix",
    ))
    .step(add_step("hotfix-patch.txt"))
    .step(commit_step("fix: handle null session token in login flow"))
    .step(checkout_trunk_step(trunk))
    .step(
        LabStep::new(
            "Merge the hotfix:",
            IntentRule::command("git merge hotfix/login-crash").phrase("merge"),
        )
        .then(Action::git(["merge", "hotfix/login-crash", "--no-edit"])),
    )
    .step(
        LabStep::new(
            "Tag the patch release:",
            IntentRule::command("git tag -a v1.1.1 -m \"Hotfix: login crash resolved\"")
                .phrase("tag"),
        )
        .then(Action::git([
            "tag",
            "-a",
            "v1.1.1",
            "-m",
            "Hotfix: login crash resolved",
        ]))
        .then(Action::quiet(["branch", "-d", "hotfix/login-crash"]))
        .then(Action::say("Production is saved! v1.1.1 is out."))
        .reward(Reward::points(60, "Hotfix workflow mastered").with_achievement("Firefighter")),
    );

    let sprint = LabScript::new(
        "FINAL BOSS: THE SPRINT SIMULATION",
        "Build the settings module from branch to release, on your own.",
    )
    .step(new_branch_step("Start the sprint task:", "feature/settings"))
    .step(echo_step(
        "settings.txt",
        "Settings Module\n- Theme: light/dark\n- Language: en, es, fr, de, ja\n- Timezone: auto-detect\n- Notification preferences\n- Privacy controls\n",
        "settings",
    ))
    .step(add_step("settings.txt"))
    .step(commit_step("feat: add settings module with theme, i18n, timezone"))
    .step(checkout_trunk_step(trunk))
    .step(
        LabStep::new(
            "Squash it in:",
            IntentRule::command("git merge --squash feature/settings")
                .phrase("merge")
                .flag("--squash"),
        )
        .then(Action::git(["merge", "--squash", "feature/settings"])),
    )
    .step(commit_step("feat: add complete settings module"))
    .step(
        LabStep::new(
            "Cut the major release:",
            IntentRule::command(
                "git tag -a v2.0.0 -m \"Release v2.0.0: complete platform with settings\"",
            )
            .phrase("tag"),
        )
        .then(Action::git([
            "tag",
            "-a",
            "v2.0.0",
            "-m",
            "Release v2.0.0: complete platform with settings",
        ])),
    )
    .step(
        LabStep::new(
            "Clean up the branch:",
            IntentRule::command("git branch -D feature/settings")
                .phrase("branch")
                .flag("-D"),
        )
        .then(Action::git(["branch", "-D", "feature/settings"]))
        .then(Action::say("SPRINT COMPLETE! Branch, commit, squash, tag, clean up."))
        .reward(
            Reward::points(200, "FINAL BOSS - SPRINT COMPLETE!")
                .with_achievement("Release Manager"),
        ),
    )
    .step(level_complete(
        "LEVEL 8 COMPLETE! feature branch -> commit -> review -> squash -> tag -> hotfix when needed.",
        Reward::points(100, "PROFESSIONAL WORKFLOW MASTERED!"),
    ));

    vec![tags, hotfix, sprint]
}

fn commit_file(ctx: &mut StepContext<'_>, path: &str, content: &str, message: &str) -> Result<()> {
    ctx.workspace().write_text(path, content)?;
    ctx.git_quiet(&["add", path]);
    ctx.git_quiet(&["commit", "-m", message]);
    Ok(())
}

fn messy_commits(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    for (content, message) in [
        ("Dashboard v1\n", "wip dashboard"),
        ("Dashboard v1\nCharts: bar, line\n", "add charts idk"),
        (
            "Dashboard v1\nCharts: bar, line, pie\nFilters: date, user\n",
            "more stuff",
        ),
        (
            "Dashboard v2\nCharts: bar, line, pie\nFilters: date, user, status\nExport: CSV, PDF\n",
            "ok final version hopefully",
        ),
    ] {
        commit_file(ctx, "dashboard.txt", content, message)?;
    }
    Ok(())
}

fn buggy_history(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    for (content, message) in [
        ("App v1.0 - Working\n", "v1.0: initial release"),
        ("App v1.1 - Added search\n", "v1.1: add search feature"),
        ("App v1.2 - Added filters\n", "v1.2: add filters"),
        ("App v1.3 - BUG INTRODUCED HERE\n", "v1.3: refactor database layer"),
        (
            "App v1.4 - Added export (still has BUG)\n",
            "v1.4: add export feature",
        ),
        (
            "App v1.5 - Added settings (still has BUG)\n",
            "v1.5: add settings page",
        ),
    ] {
        commit_file(ctx, "app.txt", content, message)?;
    }
    Ok(())
}

fn notification_commits(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    commit_file(
        ctx,
        "notifications.txt",
        "Notification System\n- Email alerts\n- Push notifications\n- SMS for critical alerts\n- In-app notification center\n",
        "feat: add notification system with email, push, SMS",
    )?;
    commit_file(
        ctx,
        "notification-tests.txt",
        "Tests for notifications\n- test_email_send: PASS\n- test_push_delivery: PASS\n- test_sms_fallback: PASS\n",
        "test: add notification system tests",
    )
}

/// Mark the learner's good commit, then let the checked-out `app.txt` decide
/// every remaining verdict until git names the first bad commit.
fn bisect_hunt(input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let typed = tokenize(input, true)
        .into_iter()
        .skip_while(|token| !token.eq_ignore_ascii_case("good"))
        .nth(1);

    let mut out = match typed {
        Some(hash) => ctx.git(&["bisect", "good", &hash]),
        None => BackendOutput::failed(""),
    };
    if !out.succeeded {
        let first = ctx.git_quiet(&["log", "--format=%h", "--grep=^v1.0: initial release", "-1"]);
        let hash = first.output.trim().to_string();
        if hash.is_empty() {
            ctx.say(Tone::Failure, "Could not find the v1.0 release commit.");
            return Ok(());
        }
        ctx.say(Tone::Story, &format!("Marking v1.0 ({hash}) as good for you."));
        out = ctx.git(&["bisect", "good", &hash]);
    }

    for _ in 0..BISECT_LIMIT {
        if out.output.contains("is the first bad commit") {
            ctx.say(Tone::Success, "FOUND IT! Bisect pinned the exact commit that broke the app.");
            return Ok(());
        }
        if !out.succeeded {
            return Ok(());
        }
        let content = ctx.workspace().read_text("app.txt");
        let verdict = if content.contains("BUG") { "bad" } else { "good" };
        ctx.say(
            Tone::Story,
            &format!("app.txt reads '{}' -> {verdict}", content.trim()),
        );
        out = ctx.git(&["bisect", verdict]);
    }
    Ok(())
}

/// Remove release tags left over from an earlier run so they can be recreated.
fn clear_release_tags(_input: &str, ctx: &mut StepContext<'_>) -> Result<()> {
    let existing = ctx.git_quiet(&["tag", "--list"]);
    let stale: Vec<&str> = RELEASE_TAGS
        .iter()
        .copied()
        .filter(|tag| existing.output.lines().any(|line| line.trim() == *tag))
        .collect();
    for tag in stale {
        ctx.git_quiet(&["tag", "-d", tag]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matcher::matches;
    use crate::io::config::QuestConfig;
    use crate::io::workspace::Workspace;
    use crate::test_support::{RecordingBackend, ScriptedConsole};

    #[test]
    fn minor_tag_rule_wants_one_one() {
        let scripts = level_8("main");
        let rule = &scripts[0].steps[2].rule;
        assert!(matches("git tag -a v1.1.0 -m \"Release v1.1.0\"", rule));
        assert!(matches("git tag v1.1", rule));
        assert!(!matches("git tag -a v1.1.1 -m hotfix", rule));
        assert!(!matches("git tag -a v2.0.0", rule));
    }

    #[test]
    fn branch_delete_accepts_either_case() {
        let scripts = level_8("main");
        let rule = &scripts[2].steps[8].rule;
        assert!(matches("git branch -D feature/settings", rule));
        assert!(matches("git branch -d feature/settings", rule));
    }

    #[test]
    fn stale_release_tags_are_deleted() {
        let backend = RecordingBackend::new();
        backend.respond("tag", BackendOutput::ok("v0.9\nv1.0.0\nv2.0.0"));
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let config = QuestConfig::default();
        let workspace = Workspace::new("/scratch/git-quest");
        let mut ctx = StepContext::new(&workspace, &backend, &config, &mut console);

        clear_release_tags("", &mut ctx).expect("clear");

        let deletes: Vec<Vec<String>> = backend
            .calls()
            .into_iter()
            .filter(|call| {
                call.operation == "tag" && call.args.first().map(String::as_str) == Some("-d")
            })
            .map(|call| call.args)
            .collect();
        assert_eq!(
            deletes,
            vec![
                vec!["-d".to_string(), "v1.0.0".to_string()],
                vec!["-d".to_string(), "v2.0.0".to_string()],
            ]
        );
    }

    #[test]
    fn level_totals() {
        let seven: u64 = level_7("main").iter().map(LabScript::points).sum();
        let eight: u64 = level_8("main").iter().map(LabScript::points).sum();
        assert_eq!(seven, 230);
        assert_eq!(eight, 430);
    }
}
