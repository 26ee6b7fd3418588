//! Test-only fakes for driving sessions without a terminal or real git.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::progress::ProgressState;
use crate::io::backend::{BackendOutput, GitBackend, VcsBackend};
use crate::io::config::QuestConfig;
use crate::io::console::{Console, Tone};
use crate::io::save_store::{LoadResult, ProgressStore};
use crate::io::workspace::Workspace;
use crate::session::Session;

/// Level count used by test sessions.
pub const TEST_LEVEL_COUNT: u32 = 8;

/// Console fed from a fixed list of input lines; records everything shown.
///
/// When the inputs run out, `read_line` reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    transcript: Vec<(Tone, String)>,
    prompts: usize,
}

impl ScriptedConsole {
    pub fn new<I, T>(inputs: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &[(Tone, String)] {
        &self.transcript
    }

    /// Every line shown with `tone`, in order.
    pub fn lines_with(&self, tone: Tone) -> Vec<String> {
        self.transcript
            .iter()
            .filter(|(shown, _)| *shown == tone)
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// True if any shown line contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.transcript.iter().any(|(_, text)| text.contains(needle))
    }

    /// Number of prompts issued so far.
    pub fn prompts(&self) -> usize {
        self.prompts
    }

    /// Inputs not consumed yet.
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for ScriptedConsole {
    fn show(&mut self, tone: Tone, text: &str) {
        self.transcript.push((tone, text.to_string()));
    }

    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.prompts += 1;
        Ok(self.inputs.pop_front().map(|line| line.trim().to_string()))
    }
}

/// One operation seen by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: String,
    pub args: Vec<String>,
    pub workdir: PathBuf,
}

/// Backend that records calls and replays queued responses per operation.
///
/// Operations without a queued response succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    responses: RefCell<HashMap<String, VecDeque<BackendOutput>>>,
    calls: RefCell<Vec<BackendCall>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `output` for the next call of `operation`.
    pub fn respond(&self, operation: &str, output: BackendOutput) {
        self.responses
            .borrow_mut()
            .entry(operation.to_string())
            .or_default()
            .push_back(output);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    /// Operation names in call order.
    pub fn operations(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.operation.clone())
            .collect()
    }
}

impl VcsBackend for RecordingBackend {
    fn execute(&self, operation: &str, args: &[&str], workdir: &Path) -> BackendOutput {
        self.calls.borrow_mut().push(BackendCall {
            operation: operation.to_string(),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
            workdir: workdir.to_path_buf(),
        });
        self.responses
            .borrow_mut()
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| BackendOutput::ok(""))
    }
}

/// In-memory progress store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<Option<ProgressState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ProgressState) -> Self {
        Self {
            state: RefCell::new(Some(state)),
        }
    }

    /// Last saved state, `None` if never saved or cleared.
    pub fn saved(&self) -> Option<ProgressState> {
        self.state.borrow().clone()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> LoadResult {
        match self.state.borrow().clone() {
            Some(state) => LoadResult::Found(state),
            None => LoadResult::Absent,
        }
    }

    fn save(&self, state: &ProgressState) -> Result<()> {
        *self.state.borrow_mut() = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.state.borrow_mut() = None;
        Ok(())
    }
}

/// Store whose every write fails, as on a read-only disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl ProgressStore for FailingStore {
    fn load(&self) -> LoadResult {
        LoadResult::Absent
    }

    fn save(&self, _state: &ProgressState) -> Result<()> {
        Err(anyhow!("save record is read-only"))
    }

    fn clear(&self) -> Result<()> {
        Err(anyhow!("permission denied"))
    }
}

/// Session over a fresh temp workspace and an in-memory store.
///
/// Keep the returned [`TempDir`] alive for the duration of the test.
pub fn test_session<B: VcsBackend>(
    backend: B,
    console: ScriptedConsole,
) -> (TempDir, Session<B, MemoryStore, ScriptedConsole>) {
    let temp = tempfile::tempdir().expect("tempdir");
    let workspace = Workspace::new(temp.path().join("git-quest"));
    let session = Session::open(
        QuestConfig::default(),
        workspace,
        backend,
        MemoryStore::new(),
        console,
        TEST_LEVEL_COUNT,
    );
    (temp, session)
}

/// Real git backend isolated from the user's config, with a fixed identity.
///
/// Global config writes (aliases, user.name) land in `home/gitconfig`.
pub fn isolated_git(home: &Path) -> GitBackend {
    GitBackend::from_config(&QuestConfig::default())
        .with_env("GIT_CONFIG_GLOBAL", home.join("gitconfig").display().to_string())
        .with_env("GIT_CONFIG_NOSYSTEM", "1")
        .with_env("GIT_AUTHOR_NAME", "Quest Tester")
        .with_env("GIT_AUTHOR_EMAIL", "tester@example.com")
        .with_env("GIT_COMMITTER_NAME", "Quest Tester")
        .with_env("GIT_COMMITTER_EMAIL", "tester@example.com")
        .with_env("GIT_TERMINAL_PROMPT", "0")
}

/// Session over a temp workspace driven by real, isolated git.
pub fn git_session(
    console: ScriptedConsole,
) -> (TempDir, Session<GitBackend, MemoryStore, ScriptedConsole>) {
    let temp = tempfile::tempdir().expect("tempdir");
    let backend = isolated_git(temp.path());
    let workspace = Workspace::new(temp.path().join("git-quest"));
    let session = Session::open(
        QuestConfig::default(),
        workspace,
        backend,
        MemoryStore::new(),
        console,
        TEST_LEVEL_COUNT,
    );
    (temp, session)
}
