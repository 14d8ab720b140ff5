//! Per-group confirmation capability.
//!
//! The orchestrator receives an optional [`Confirmer`] instead of prompting
//! directly, so it can run headless with a scripted yes/no function.

use std::cell::RefCell;
use std::io::{BufRead, Write};

use tracing::warn;

/// What the user is asked to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmRequest<'a> {
    /// Full commit message (subject plus bullets).
    pub message: &'a str,
    pub files: &'a [String],
    /// Command line the backend is about to run.
    pub planned_command: &'a str,
    /// 1-based position of the group in the batch.
    pub position: usize,
    pub total: usize,
}

/// Approval step consulted before each group is applied.
pub trait Confirmer {
    /// Return true to proceed with the group, false to skip it.
    fn confirm(&self, request: &ConfirmRequest<'_>) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&ConfirmRequest<'_>) -> bool,
{
    fn confirm(&self, request: &ConfirmRequest<'_>) -> bool {
        self(request)
    }
}

/// Interactive confirmer: renders the plan to `output`, reads an answer line
/// from `input`. Only `y`/`yes` (any case) approves; EOF and read errors
/// decline.
pub struct PromptConfirmer<R, W> {
    input: RefCell<R>,
    output: RefCell<W>,
}

impl<R: BufRead, W: Write> PromptConfirmer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: RefCell::new(input),
            output: RefCell::new(output),
        }
    }

    fn render(&self, request: &ConfirmRequest<'_>) -> std::io::Result<()> {
        let mut out = self.output.borrow_mut();
        writeln!(out)?;
        writeln!(out, "Commit {}/{}:", request.position, request.total)?;
        for line in request.message.lines() {
            writeln!(out, "  {line}")?;
        }
        writeln!(out, "Files: {}", request.files.join(", "))?;
        writeln!(out, "Command: {}", request.planned_command)?;
        write!(out, "Proceed? [y/N]: ")?;
        out.flush()
    }
}

impl PromptConfirmer<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Prompt on stderr, answer on stdin.
    pub fn terminal() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirmer for PromptConfirmer<R, W> {
    fn confirm(&self, request: &ConfirmRequest<'_>) -> bool {
        if let Err(err) = self.render(request) {
            warn!(err = %err, "failed to render confirmation prompt");
        }
        let mut answer = String::new();
        match self.input.borrow_mut().read_line(&mut answer) {
            Ok(0) => false,
            Ok(_) => is_yes(&answer),
            Err(err) => {
                warn!(err = %err, "failed to read confirmation answer");
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
