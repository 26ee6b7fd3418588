//! Learner console: the seam between the engine and the terminal.
//!
//! The engine only ever says *what kind* of text it is showing ([`Tone`]);
//! how that looks is up to the console. Tests use a scripted console.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use anyhow::{Context, Result};
use tracing::debug;

/// Kind of narration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Banner,
    Story,
    Mission,
    Instruction,
    /// Canonical command the learner should type.
    Command,
    /// Raw backend output or file contents.
    Output,
    Success,
    Failure,
    Hint,
    Reward,
    Achievement,
}

pub trait Console {
    fn show(&mut self, tone: Tone, text: &str);

    /// Prompt for one line of input. `Ok(None)` means input has ended.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Plain-text console over any reader/writer pair.
pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
}

impl TerminalConsole<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn show(&mut self, tone: Tone, text: &str) {
        let rendered = render(tone, text);
        if let Err(err) = writeln!(self.output, "{rendered}").and_then(|()| self.output.flush()) {
            debug!(err = %err, "console write failed");
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "\n  {prompt}").context("write prompt")?;
        self.output.flush().context("flush prompt")?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).context("read learner input")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Render one narration line as plain text.
pub fn render(tone: Tone, text: &str) -> String {
    match tone {
        Tone::Banner => {
            let rule = "=".repeat(50);
            format!("\n{rule}\n  {text}\n{rule}\n")
        }
        Tone::Story => format!("  {text}"),
        Tone::Mission => format!("\n  MISSION: {text}\n"),
        Tone::Instruction => format!("\n  > {text}"),
        Tone::Command => format!("\n  $  {text}"),
        Tone::Output => indent(text),
        Tone::Success => format!("\n  [ok] {text}"),
        Tone::Failure => format!("\n  [!!] {text}"),
        Tone::Hint => format!("\n  Hint: {text}"),
        Tone::Reward => format!("\n  {text}"),
        Tone::Achievement => format!("\n  ACHIEVEMENT UNLOCKED: {text}!"),
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
