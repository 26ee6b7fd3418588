//! Child process execution with a hard timeout and bounded output capture.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of a finished (or killed) child process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// Bytes dropped across both streams because of the output limit.
    pub truncated_bytes: usize,
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Exited on its own with status zero.
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Run `cmd` to completion, killing it after `timeout`.
///
/// stdin is closed so a child that wants interactive input (an editor, a
/// credential prompt) fails fast instead of hanging the lab. stdout/stderr are
/// drained on reader threads while the child runs; at most `output_limit_bytes`
/// per stream are kept.
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProcessOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = cmd.spawn().context("spawn command")?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_dropped) = join_reader(stdout_handle).context("join stdout")?;
    let (stderr, stderr_dropped) = join_reader(stderr_handle).context("join stderr")?;
    let truncated_bytes = stdout_dropped + stderr_dropped;
    if truncated_bytes > 0 {
        warn!(truncated_bytes, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(ProcessOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        truncated_bytes,
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let room = limit.saturating_sub(buf.len());
        let keep = n.min(room);
        buf.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }

    Ok((buf, dropped))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams() {
        let out = run_with_timeout(sh("echo out; echo err >&2"), Duration::from_secs(5), 1024)
            .expect("run");
        assert!(out.succeeded());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn nonzero_exit_is_not_success() {
        let out = run_with_timeout(sh("exit 3"), Duration::from_secs(5), 1024).expect("run");
        assert!(!out.succeeded());
        assert_eq!(out.status.code(), Some(3));
    }

    #[test]
    fn timeout_kills_child() {
        let out = run_with_timeout(sh("sleep 5"), Duration::from_millis(100), 1024).expect("run");
        assert!(out.timed_out);
        assert!(!out.succeeded());
    }

    #[test]
    fn output_beyond_limit_is_dropped() {
        let out = run_with_timeout(sh("printf 'abcdefghij'"), Duration::from_secs(5), 4)
            .expect("run");
        assert_eq!(out.stdout, "abcd");
        assert_eq!(out.truncated_bytes, 6);
    }
}
