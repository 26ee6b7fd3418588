//! Levels 1 and 2: identity, first repository, the three zones, undo spells.

use crate::core::matcher::IntentRule;
use crate::core::types::Reward;
use crate::lab::{Action, LabScript, LabStep};

use super::{add_step, commit_step, echo_step, run_typed, status_step};

pub(super) fn level_1(_trunk: &str) -> Vec<LabScript> {
    let identity = LabScript::new("LEVEL 1 - LAB 1: YOUR IDENTITY", "Tell Git who you are.")
        .story("Before wielding Git, you must register your identity.")
        .story(
            "Git needs two things: your name and your email. They appear on every commit you make.",
        )
        .step(
            LabStep::new(
                "Type this command (use YOUR real name):",
                IntentRule::command("git config --global user.name \"Your Name\"")
                    .phrase("git config")
                    .mention("user.name"),
            )
            .then(Action::Custom(run_typed))
            .then(Action::say("Identity name set!"))
            .reward(Reward::points(10, "Name configured")),
        )
        .step(
            LabStep::new(
                "Now set your email:",
                IntentRule::command("git config --global user.email \"you@example.com\"")
                    .phrase("git config")
                    .mention("user.email"),
            )
            .then(Action::Custom(run_typed))
            .then(Action::say("Identity email set!"))
            .reward(Reward::points(10, "Email configured")),
        )
        .step(
            LabStep::new(
                "Let's verify it worked:",
                IntentRule::command("git config user.name")
                    .mention("config")
                    .mention("user.name"),
            )
            .then(Action::Custom(run_typed))
            .then(Action::say("Your name appeared above! Identity confirmed.")),
        );

    let first_repo = LabScript::new(
        "LEVEL 1 - LAB 2: CREATE YOUR FIRST REPO",
        "Create a Git repository from scratch.",
    )
    .story("A 'repo' is just a folder that Git watches over.")
    .story("Any old quest folder is cleared so you start fresh.")
    .setup(Action::Wipe)
    .step(
        LabStep::new(
            "Type this to create a new folder:",
            IntentRule::command("mkdir git-quest").phrase("mkdir"),
        )
        .then(Action::EnsureRoot)
        .then(Action::say("Folder created!")),
    )
    .step(
        LabStep::new("Now enter the folder:", IntentRule::command("cd git-quest").phrase("cd"))
            .then(Action::say("You're inside git-quest!")),
    )
    .step(
        LabStep::new("Now cast the init spell:", IntentRule::command("git init").exact("git init"))
            .then(Action::Init)
            .then(Action::say("Repository created! Git is now watching this folder."))
            .reward(Reward::points(20, "First repository!")),
    );

    let three_zones = LabScript::new(
        "LEVEL 1 - LAB 3: THE THREE ZONES",
        "Understand how Git saves your work.",
    )
    .story("WORKING DIR  --git add-->  STAGING  --git commit-->  SAVED")
    .story(
        "Like mailing a package: pick items (edit files), put them in the box (git add), seal and label it (git commit).",
    )
    .step(LabStep::pause("Got it? Let's try it."))
    .step(echo_step("hero.txt", "Hello, I am learning Git!\n", "hero.txt"))
    .step(
        status_step("Now check what Git sees:").then(Action::say(
            "hero.txt is untracked: it is in your working directory but NOT staged yet.",
        )),
    )
    .step(add_step("hero.txt"))
    .step(
        status_step("Check status again and notice the change:")
            .then(Action::say("Now it is staged and ready to be committed.")),
    )
    .step(
        LabStep::new(
            "Commit it (seal the box with a label):",
            IntentRule::command("git commit -m \"Begin my quest: create hero file\"")
                .phrase("git commit")
                .flag("-m"),
        )
        .then(Action::commit(["commit"], "Begin my quest: create hero file"))
        .then(Action::say("COMMITTED! Your first save point!"))
        .reward(Reward::points(30, "First commit!").with_achievement("First Commit")),
    );

    let history = LabScript::new(
        "LEVEL 1 - LAB 4: BUILD YOUR HISTORY",
        "Make another commit and explore your timeline.",
    )
    .step(
        LabStep::new(
            "Add a second line to hero.txt:",
            IntentRule::command("echo \"I completed Level 1!\" >> hero.txt").mention("hero.txt"),
        )
        .then(Action::append("hero.txt", "I completed Level 1!\n"))
        .then(Action::say("File updated!")),
    )
    .step(
        LabStep::new("See what changed:", IntentRule::command("git diff").phrase("diff"))
            .then(Action::git(["diff"]))
            .then(Action::say("The + line is what you ADDED. Git tracks every change!")),
    )
    .step(add_step("hero.txt"))
    .step(
        commit_step("Update hero: completed Level 1")
            .then(Action::say("Second commit saved!"))
            .reward(Reward::points(20, "Building history")),
    )
    .step(
        LabStep::new("View your timeline:", IntentRule::command("git log --oneline").phrase("log"))
            .then(Action::git(["log", "--oneline"]))
            .then(Action::say("Two commits! You can see your entire journey!"))
            .reward(Reward::points(10, "Explored history").with_achievement("Time Traveler")),
    )
    .step(LabStep::pause(
        "LEVEL 1 COMPLETE! You learned init, add, commit -m, status, diff and log.",
    ));

    vec![identity, first_repo, three_zones, history]
}

pub(super) fn level_2(_trunk: &str) -> Vec<LabScript> {
    let party = LabScript::new(
        "LEVEL 2 - LAB 1: BUILD YOUR PARTY",
        "Create multiple files and stage them all at once.",
    )
    .step(echo_step("warrior.txt", "Warrior - High strength\n", "warrior"))
    .step(echo_step("mage.txt", "Mage - High intelligence\n", "mage"))
    .step(echo_step("healer.txt", "Healer - High wisdom\n", "healer"))
    .step(
        LabStep::new(
            "Stage everything at once (the dot means 'all'):",
            IntentRule::command("git add .").phrase("git add"),
        )
        .then(Action::quiet(["add", "."]))
        .then(Action::say("All three files staged!")),
    )
    .step(
        commit_step("Recruit party: warrior, mage, healer")
            .reward(Reward::points(30, "Multi-file commit")),
    );

    let restore = LabScript::new(
        "LEVEL 2 - LAB 2: UNDO SPELL - RESTORE",
        "Undo changes you haven't staged yet.",
    )
    .story("Oh no! A curse corrupts the warrior file...")
    .step(echo_step("warrior.txt", "CORRUPTED DATA\n", "warrior"))
    .step(
        LabStep::new(
            "See the damage:",
            IntentRule::command("git diff warrior.txt").phrase("diff"),
        )
        .then(Action::git(["diff", "warrior.txt"])),
    )
    .step(
        LabStep::new(
            "Cast the restore spell:",
            IntentRule::command("git restore warrior.txt")
                .mention("restore")
                .mention("warrior")
                .forbid_flag("--staged"),
        )
        .then(Action::quiet(["restore", "warrior.txt"]))
        .then(Action::show("warrior.txt"))
        .then(Action::say("warrior.txt is back to normal!"))
        .reward(Reward::points(30, "Restore spell mastered")),
    );

    let unstage = LabScript::new(
        "LEVEL 2 - LAB 3: UNDO SPELL - UNSTAGE",
        "Remove a file from staging without losing changes.",
    )
    .step(echo_step("thief.txt", "Thief - High agility\n", "thief"))
    .step(add_step("thief.txt"))
    .step(
        LabStep::new(
            "Changed your mind? Unstage it:",
            IntentRule::command("git restore --staged thief.txt")
                .mention("restore")
                .mention("staged"),
        )
        .then(Action::quiet(["restore", "--staged", "thief.txt"]))
        .then(Action::Remove("thief.txt".to_string()))
        .then(Action::say("Unstaged! The thief left the party."))
        .reward(Reward::points(20, "Unstage spell mastered")),
    );

    let amend = LabScript::new(
        "LEVEL 2 - LAB 4: UNDO SPELL - AMEND",
        "Fix a bad commit message.",
    )
    .story("potion.txt is ready and staged. Commit it... with a typo.")
    .setup(Action::write("potion.txt", "Health Potion - Restore 50 HP\n"))
    .setup(Action::quiet(["add", "potion.txt"]))
    .step(
        LabStep::new(
            "Commit with the typo:",
            IntentRule::command("git commit -m \"Add heath poton\"").phrase("commit"),
        )
        .then(Action::git(["commit", "-m", "Add heath poton"]))
        .then(Action::say("Oops! 'heath poton'? Let's fix that.")),
    )
    .step(
        LabStep::new(
            "Amend the message:",
            IntentRule::command("git commit --amend -m \"Add health potion\"").mention("amend"),
        )
        .then(Action::commit(["commit", "--amend"], "Add health potion"))
        .then(Action::git(["log", "--oneline", "-1"]))
        .then(Action::say("Typo fixed! Amend rewrites the last commit."))
        .reward(Reward::points(20, "Amend spell mastered")),
    );

    let reset = LabScript::new(
        "LEVEL 2 - LAB 5: UNDO SPELL - RESET",
        "Undo your last commit entirely (but keep the files).",
    )
    .story("--soft keeps your changes staged. --hard throws them away, so use it with care.")
    .step(
        LabStep::new(
            "Undo the last commit:",
            IntentRule::command("git reset --soft HEAD~1")
                .mention("reset")
                .flag("--soft"),
        )
        .then(Action::git(["reset", "--soft", "HEAD~1"]))
        .then(Action::git(["status"]))
        .then(Action::say("The commit is gone but potion.txt is still staged."))
        .then(Action::quiet(["commit", "-m", "Add health potion"]))
        .reward(Reward::points(30, "Reset spell mastered")),
    );

    let ignore = LabScript::new(
        "LEVEL 2 - LAB 6: THE IGNORE SHIELD",
        "Tell Git to ignore files you don't want tracked.",
    )
    .step(echo_step("secrets.txt", "SECRET_KEY=abc123\n", "secret"))
    .step(
        LabStep::new(
            "Raise the ignore shield:",
            IntentRule::command("echo \"secrets.txt\" > .gitignore").mention("ignore"),
        )
        .then(Action::write(".gitignore", "secrets.txt\n*.log\n"))
        .then(Action::say(".gitignore created!")),
    )
    .step(
        status_step("Check status:")
            .then(Action::say("secrets.txt is invisible to Git now!"))
            .then(Action::quiet(["add", ".gitignore"]))
            .then(Action::quiet(["commit", "-m", "Add ignore shield"]))
            .reward(Reward::points(20, "Ignore shield activated")),
    )
    .step(LabStep::pause(
        "LEVEL 2 COMPLETE! You learned add ., restore, restore --staged, commit --amend, reset --soft and .gitignore.",
    ));

    vec![party, restore, unstage, amend, reset, ignore]
}
