//! Lab steps and scripts: prompt, match, apply, reward.
//!
//! A [`LabStep`] is one prompt-validate-apply-reward unit. It loops on learner
//! input until the [`IntentRule`] accepts, then applies its [`Action`]s against
//! the scratch repository and grants its [`Reward`]. A [`LabScript`] is an
//! ordered list of steps run strictly in order with no skipping.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::matcher::{IntentRule, flag_value, matches};
use crate::core::types::{Flow, Reward, StepPhase};
use crate::io::backend::{BackendOutput, Repo, VcsBackend};
use crate::io::config::QuestConfig;
use crate::io::console::{Console, Tone};
use crate::io::save_store::ProgressStore;
use crate::io::workspace::Workspace;
use crate::session::Session;

/// Input that leaves the current level from any prompt.
pub const QUIT_COMMANDS: [&str; 2] = [":quit", ":q"];

const COMMAND_PROMPT: &str = "Type the command and press ENTER: ";
const PAUSE_PROMPT: &str = "Press ENTER to continue... ";

/// Accept-action with access to the raw input and the step context.
pub type CustomAction = fn(&str, &mut StepContext<'_>) -> Result<()>;

/// One side effect applied after a step's input is accepted.
#[derive(Clone)]
pub enum Action {
    /// Backend operation; output is shown to the learner.
    Git(Vec<String>),
    /// Backend operation; output is shown only on failure.
    Quiet(Vec<String>),
    /// Commit-style operation; the message comes from the learner's `-m`.
    Commit { args: Vec<String>, fallback: String },
    /// `git init` with the configured default branch.
    Init,
    Write { path: String, content: String },
    Append { path: String, content: String },
    Remove(String),
    /// Print a workspace file, pointing out conflict markers.
    Show(String),
    /// Create the workspace root.
    EnsureRoot,
    /// Delete the workspace (used when a level starts from scratch).
    Wipe,
    /// Success line shown once the earlier actions ran.
    Say(String),
    Custom(CustomAction),
}

impl Action {
    pub fn git<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        Action::Git(args.into_iter().map(str::to_string).collect())
    }

    pub fn quiet<'a>(args: impl IntoIterator<Item = &'a str>) -> Self {
        Action::Quiet(args.into_iter().map(str::to_string).collect())
    }

    pub fn commit<'a>(args: impl IntoIterator<Item = &'a str>, fallback: &str) -> Self {
        Action::Commit {
            args: args.into_iter().map(str::to_string).collect(),
            fallback: fallback.to_string(),
        }
    }

    pub fn write(path: &str, content: &str) -> Self {
        Action::Write {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    pub fn append(path: &str, content: &str) -> Self {
        Action::Append {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    pub fn show(path: &str) -> Self {
        Action::Show(path.to_string())
    }

    pub fn say(text: &str) -> Self {
        Action::Say(text.to_string())
    }
}

/// Atomic unit of instruction.
#[derive(Clone)]
pub struct LabStep {
    pub narration: String,
    pub rule: IntentRule,
    pub actions: Vec<Action>,
    pub reward: Reward,
}

impl LabStep {
    pub fn new(narration: &str, rule: IntentRule) -> Self {
        Self {
            narration: narration.to_string(),
            rule,
            actions: Vec::new(),
            reward: Reward::none(),
        }
    }

    /// A pause that accepts any input and does nothing.
    pub fn pause(narration: &str) -> Self {
        Self::new(narration, IntentRule::anything())
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn reward(mut self, reward: Reward) -> Self {
        self.reward = reward;
        self
    }
}

/// Ordered steps forming one instructional unit.
#[derive(Clone, Default)]
pub struct LabScript {
    pub title: String,
    pub mission: String,
    pub story: Vec<String>,
    /// Scripted operations run before the first step (e.g. a teammate's commits).
    pub setup: Vec<Action>,
    pub steps: Vec<LabStep>,
}

impl LabScript {
    pub fn new(title: &str, mission: &str) -> Self {
        Self {
            title: title.to_string(),
            mission: mission.to_string(),
            ..Self::default()
        }
    }

    pub fn story(mut self, line: &str) -> Self {
        self.story.push(line.to_string());
        self
    }

    pub fn setup(mut self, action: Action) -> Self {
        self.setup.push(action);
        self
    }

    pub fn step(mut self, step: LabStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Total points the script can award.
    pub fn points(&self) -> u64 {
        self.steps
            .iter()
            .map(|step| u64::from(step.reward.points))
            .sum()
    }
}

/// Result of running one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRun {
    /// Last phase reached: `Rewarded` on completion, `Prompting` if abandoned.
    pub phase: StepPhase,
    /// Inputs rejected before acceptance.
    pub rejected: u32,
}

impl StepRun {
    pub fn flow(&self) -> Flow {
        if self.phase == StepPhase::Rewarded {
            Flow::Completed
        } else {
            Flow::Abandoned
        }
    }
}

/// Everything an accept-action may touch.
pub struct StepContext<'a> {
    workspace: &'a Workspace,
    backend: &'a dyn VcsBackend,
    config: &'a QuestConfig,
    console: &'a mut dyn Console,
    failures: u32,
}

impl<'a> StepContext<'a> {
    pub fn new(
        workspace: &'a Workspace,
        backend: &'a dyn VcsBackend,
        config: &'a QuestConfig,
        console: &'a mut dyn Console,
    ) -> Self {
        Self {
            workspace,
            backend,
            config,
            console,
            failures: 0,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        self.workspace
    }

    pub fn config(&self) -> &QuestConfig {
        self.config
    }

    pub fn repo(&self) -> Repo<'_> {
        Repo::new(self.backend, self.workspace.root())
    }

    /// Failures narrated so far in this context.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn say(&mut self, tone: Tone, text: &str) {
        self.console.show(tone, text);
    }

    /// Run a backend operation in the workspace and show its output.
    pub fn git(&mut self, args: &[&str]) -> BackendOutput {
        let root = self.workspace.root().to_path_buf();
        self.git_in(&root, args, true)
    }

    /// Run a backend operation in the workspace; output shown only on failure.
    pub fn git_quiet(&mut self, args: &[&str]) -> BackendOutput {
        let root = self.workspace.root().to_path_buf();
        self.git_in(&root, args, false)
    }

    /// Run a backend operation in another directory (a teammate's clone).
    pub fn git_in(&mut self, dir: &Path, args: &[&str], echo: bool) -> BackendOutput {
        let Some((operation, rest)) = args.split_first() else {
            return BackendOutput::failed("no backend operation given");
        };
        let out = self.backend.execute(operation, rest, dir);
        if out.succeeded {
            if echo && !out.output.is_empty() {
                self.console.show(Tone::Output, &out.output);
            }
        } else {
            self.failures += 1;
            self.console
                .show(Tone::Failure, &format!("git {operation} did not succeed:"));
            if !out.output.is_empty() {
                self.console.show(Tone::Output, &out.output);
            }
        }
        out
    }

    /// Narrate a non-backend failure (workspace I/O, custom action error).
    pub fn report_error(&mut self, err: &anyhow::Error) {
        self.failures += 1;
        self.console
            .show(Tone::Failure, &format!("Something went wrong: {err:#}"));
    }
}

/// Apply `actions` in order. Failures are narrated, never retried, and never
/// stop the remaining actions.
#[instrument(skip_all, fields(actions = actions.len()))]
pub fn apply_actions(input: &str, actions: &[Action], ctx: &mut StepContext<'_>) {
    for action in actions {
        if let Err(err) = apply(input, action, ctx) {
            ctx.report_error(&err);
        }
    }
    if ctx.failures() > 0 {
        debug!(failures = ctx.failures(), "actions finished with failures");
    }
}

fn apply(input: &str, action: &Action, ctx: &mut StepContext<'_>) -> Result<()> {
    match action {
        Action::Git(args) => {
            ctx.git(&as_strs(args));
        }
        Action::Quiet(args) => {
            ctx.git_quiet(&as_strs(args));
        }
        Action::Commit { args, fallback } => {
            let message =
                flag_value(input, &["-m", "--message"]).unwrap_or_else(|| fallback.clone());
            let mut full = as_strs(args);
            full.push("-m");
            full.push(&message);
            ctx.git(&full);
        }
        Action::Init => {
            ctx.workspace().ensure_root()?;
            let branch = format!("--initial-branch={}", ctx.config().default_branch);
            ctx.git(&["init", &branch]);
        }
        Action::Write { path, content } => ctx.workspace().write_text(path, content)?,
        Action::Append { path, content } => ctx.workspace().append_text(path, content)?,
        Action::Remove(path) => ctx.workspace().remove(path)?,
        Action::Show(path) => {
            let content = ctx.workspace().read_text(path);
            ctx.say(Tone::Output, &annotate_conflict_markers(&content));
        }
        Action::EnsureRoot => ctx.workspace().ensure_root()?,
        Action::Wipe => ctx.workspace().wipe()?,
        Action::Say(text) => ctx.say(Tone::Success, text),
        Action::Custom(custom) => custom(input, ctx)?,
    }
    Ok(())
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

/// Label the three conflict markers so the learner can read a conflicted file.
pub fn annotate_conflict_markers(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.starts_with("<<<<<<<") {
                format!("{line}   <- your branch starts here")
            } else if line.starts_with("=======") {
                format!("{line}   <- divider between the two versions")
            } else if line.starts_with(">>>>>>>") {
                format!("{line}   <- the other branch ends here")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_quit(input: &str) -> bool {
    QUIT_COMMANDS
        .iter()
        .any(|quit| input.trim().eq_ignore_ascii_case(quit))
}

/// Drive one step through Prompting -> Applying -> Rewarded.
///
/// Rejected input produces a hint and another prompt, without limit. Only
/// console failures are returned as errors.
#[instrument(skip_all, fields(step = %step.narration))]
pub fn run_step<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    step: &LabStep,
) -> Result<StepRun> {
    let mut phase = StepPhase::Prompting;
    let mut rejected = 0u32;

    session.say(Tone::Instruction, &step.narration);
    if !step.rule.canonical().is_empty() {
        session.say(Tone::Command, step.rule.canonical());
    }
    let prompt = if step.rule.accepts_anything() {
        PAUSE_PROMPT
    } else {
        COMMAND_PROMPT
    };

    let input = loop {
        let Some(line) = session.read_line(prompt)? else {
            info!(rejected, "input ended while prompting");
            return Ok(StepRun { phase, rejected });
        };
        if is_quit(&line) {
            info!(rejected, "learner left the level");
            return Ok(StepRun { phase, rejected });
        }
        if matches(&line, &step.rule) {
            break line;
        }
        rejected += 1;
        debug!(rejected, input = %line, "input rejected");
        session.say(Tone::Hint, &step.rule.hint());
    };

    phase = StepPhase::Applying;
    debug!(?phase, input = %input, "input accepted");
    {
        let mut ctx = session.step_context();
        apply_actions(&input, &step.actions, &mut ctx);
    }

    session.grant(&step.reward);
    phase = StepPhase::Rewarded;
    Ok(StepRun { phase, rejected })
}

/// Run the script's setup, then every step in order.
#[instrument(skip_all, fields(script = %script.title))]
pub fn run_script<B: VcsBackend, S: ProgressStore, C: Console>(
    session: &mut Session<B, S, C>,
    script: &LabScript,
) -> Result<Flow> {
    session.say(Tone::Banner, &script.title);
    if !script.mission.is_empty() {
        session.say(Tone::Mission, &script.mission);
    }
    for line in &script.story {
        session.say(Tone::Story, line);
    }
    if !script.setup.is_empty() {
        let mut ctx = session.step_context();
        apply_actions("", &script.setup, &mut ctx);
    }

    for (index, step) in script.steps.iter().enumerate() {
        let run = run_step(session, step)?;
        if run.flow() == Flow::Abandoned {
            info!(step = index + 1, "script abandoned");
            return Ok(Flow::Abandoned);
        }
    }
    Ok(Flow::Completed)
}
