//! Version-control backend adapter.
//!
//! Lab steps drive a real repository, so the engine talks to git through the
//! small [`VcsBackend`] seam. Nothing crosses this boundary as an error: a
//! missing executable, a non-zero exit and a timeout all come back as a
//! non-success [`BackendOutput`] carrying diagnostic text. Tests substitute a
//! recording backend.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::io::config::QuestConfig;
use crate::io::process::run_with_timeout;

/// Result of one backend operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOutput {
    pub succeeded: bool,
    /// stdout then stderr, each trimmed, joined by a newline.
    pub output: String,
}

impl BackendOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }

    /// True when git reported a merge conflict.
    pub fn reports_conflict(&self) -> bool {
        self.output.contains("CONFLICT") || self.output.contains("Automatic merge failed")
    }
}

/// Executes a single version-control operation in a working directory.
pub trait VcsBackend {
    fn execute(&self, operation: &str, args: &[&str], workdir: &Path) -> BackendOutput;
}

/// Backend that spawns the `git` executable.
#[derive(Debug, Clone)]
pub struct GitBackend {
    program: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
    envs: Vec<(String, String)>,
}

impl GitBackend {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            program: program.into(),
            timeout,
            output_limit_bytes,
            envs: Vec::new(),
        }
    }

    pub fn from_config(cfg: &QuestConfig) -> Self {
        Self::new(
            &cfg.git_program,
            Duration::from_secs(cfg.backend_timeout_secs),
            cfg.output_limit_bytes,
        )
    }

    /// Set an environment variable for every spawned git process.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl VcsBackend for GitBackend {
    #[instrument(skip_all, fields(operation = operation))]
    fn execute(&self, operation: &str, args: &[&str], workdir: &Path) -> BackendOutput {
        let mut cmd = Command::new(&self.program);
        cmd.arg(operation).args(args).current_dir(workdir);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        match run_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(out) if out.timed_out => {
                warn!(operation, "git timed out");
                BackendOutput::failed(format!(
                    "git {operation} timed out after {}s",
                    self.timeout.as_secs()
                ))
            }
            Ok(out) => {
                debug!(operation, succeeded = out.succeeded(), "git finished");
                BackendOutput {
                    succeeded: out.succeeded(),
                    output: combine_streams(&out.stdout, &out.stderr),
                }
            }
            Err(err) => {
                warn!(operation, err = %err, "git could not run");
                BackendOutput::failed(format!("git {operation} could not run: {err:#}"))
            }
        }
    }
}

fn combine_streams(stdout: &str, stderr: &str) -> String {
    let (out, err) = (stdout.trim(), stderr.trim());
    match (out.is_empty(), err.is_empty()) {
        (true, _) => err.to_string(),
        (_, true) => out.to_string(),
        _ => format!("{out}\n{err}"),
    }
}

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    /// Unmerged entries left behind by a conflicted merge.
    pub fn is_unmerged(&self) -> bool {
        matches!(
            self.code.as_str(),
            "DD" | "AU" | "UD" | "UA" | "DU" | "AA" | "UU"
        )
    }
}

/// Read-only queries against the repository rooted at `root`.
///
/// The engine never caches repository state; every question goes back to
/// the backend.
pub struct Repo<'a> {
    backend: &'a dyn VcsBackend,
    root: &'a Path,
}

impl<'a> Repo<'a> {
    pub fn new(backend: &'a dyn VcsBackend, root: &'a Path) -> Self {
        Self { backend, root }
    }

    fn query(&self, operation: &str, args: &[&str]) -> Option<String> {
        let out = self.backend.execute(operation, args, self.root);
        out.succeeded.then_some(out.output)
    }

    /// Current branch name, `None` on detached HEAD or outside a repo.
    pub fn current_branch(&self) -> Option<String> {
        self.query("branch", &["--show-current"])
            .map(|out| out.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    pub fn commit_count(&self) -> u32 {
        self.query("rev-list", &["--count", "HEAD"])
            .and_then(|out| out.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn branches(&self) -> Vec<String> {
        self.query("branch", &["--format=%(refname:short)"])
            .map(|out| {
                out.lines()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Abbreviated hash of `rev`.
    pub fn short_hash(&self, rev: &str) -> Option<String> {
        self.query("rev-parse", &["--short", rev])
            .map(|out| out.trim().to_string())
            .filter(|hash| !hash.is_empty())
    }

    pub fn status_entries(&self) -> Vec<StatusEntry> {
        self.query("status", &["--porcelain=v1", "-uall"])
            .map(|out| out.lines().filter_map(parse_status_line).collect())
            .unwrap_or_default()
    }

    /// True while a merge has unresolved paths.
    pub fn has_conflict(&self) -> bool {
        self.status_entries().iter().any(StatusEntry::is_unmerged)
    }
}

fn parse_status_line(line: &str) -> Option<StatusEntry> {
    if line.trim().is_empty() {
        return None;
    }
    if let Some(path) = line.strip_prefix("?? ") {
        return Some(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    if line.len() < 4 || !line.is_char_boundary(2) || !line.is_char_boundary(3) {
        return None;
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim().to_string();
    if let Some((_, new)) = path.split_once("->") {
        path = new.trim().to_string();
    }
    Some(StatusEntry { code, path })
}
