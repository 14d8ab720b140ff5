//! Git adapter.
//!
//! Git is treated as an opaque backend: we keep a small, explicit wrapper
//! around `git` subprocess calls and never touch repository internals.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::io::process::{CommandLimits, CommandOutput, run_command_with_timeout};

/// Parsed `git status --porcelain` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// 2-letter XY code, or "??" for untracked.
    pub code: String,
    /// Path for the changed file.
    pub path: String,
}

impl StatusEntry {
    /// Index (staged) column of the XY code.
    pub fn index_status(&self) -> char {
        self.code.chars().next().unwrap_or(' ')
    }

    /// Worktree (unstaged) column of the XY code.
    pub fn worktree_status(&self) -> char {
        self.code.chars().nth(1).unwrap_or(' ')
    }
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self::with_program("git", workdir)
    }

    /// Use a specific git executable (e.g. from `--git`).
    pub fn with_program(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Raw `git status --porcelain` text, bounded, plus the entries parsed
    /// from its complete lines.
    ///
    /// When the output was truncated the trailing partial line is dropped and
    /// the truncation notice only appears in the text.
    pub fn status_text(&self, limits: CommandLimits) -> Result<(String, Vec<StatusEntry>)> {
        let output = self.run_bounded_output(&["status", "--porcelain"], limits)?;
        let raw = String::from_utf8_lossy(&output.stdout);
        let entries = parse_status(complete_lines(&raw, output.stdout_truncated > 0))?;
        Ok((output.stdout_text("git"), entries))
    }

    /// Diff text, bounded. `staged` selects `--staged`; `name_status` selects
    /// `--name-status` instead of the full patch.
    pub fn diff_text(&self, staged: bool, name_status: bool, limits: CommandLimits) -> Result<String> {
        let mut args = vec!["diff"];
        if staged {
            args.push("--staged");
        }
        if name_status {
            args.push("--name-status");
        }
        self.run_bounded(&args, limits)
    }

    /// Get status entries (including untracked) in porcelain format.
    pub fn status_porcelain(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run_capture(&["status", "--porcelain=v1", "-uall"])?;
        parse_status(&out)
    }

    /// Stage one path. Additions, modifications and deletions all go through
    /// `git add`, so the change kind does not matter here.
    #[instrument(skip_all, fields(path))]
    pub fn stage_path(&self, path: &str) -> Result<String> {
        debug!(path, "staging path");
        self.run_capture(&["add", "--", path])
    }

    /// Commit exactly `paths` with `message`, returning git's stdout.
    ///
    /// Other staged paths are left staged and out of this commit.
    #[instrument(skip_all, fields(paths = paths.len()))]
    pub fn commit_paths(&self, message: &str, paths: &[String]) -> Result<String> {
        debug!("committing paths");
        let mut args = vec!["commit", "-m", message, "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run_capture(&args)
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let out = self.run(&["diff", "--cached", "--name-only"])?;
        Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
    }

    fn run_bounded(&self, args: &[&str], limits: CommandLimits) -> Result<String> {
        Ok(self.run_bounded_output(args, limits)?.stdout_text("git"))
    }

    fn run_bounded_output(&self, args: &[&str], limits: CommandLimits) -> Result<CommandOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).current_dir(&self.workdir);
        let output = run_command_with_timeout(cmd, limits)
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if output.timed_out {
            return Err(anyhow!(
                "git {} timed out after {:?}",
                args.join(" "),
                limits.timeout
            ));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("git {} failed: {}", args.join(" "), stderr.trim()));
        }
        Ok(output)
    }

    fn run_capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        let output = self.run(args)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            // `git commit` reports "nothing to commit" on stdout.
            let reason = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(anyhow!("git {} failed: {}", args.join(" "), reason));
        }
        Ok(output)
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        Command::new(&self.program)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("spawn {} {}", self.program, args.join(" ")))
    }
}

/// Parse porcelain v1 output into entries, skipping blank lines.
pub fn parse_status(out: &str) -> Result<Vec<StatusEntry>> {
    let mut entries = Vec::new();
    for line in out.lines() {
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_status_line(line)?);
    }
    Ok(entries)
}

/// Text up to and including the last newline when `truncated`, else all of it.
fn complete_lines(text: &str, truncated: bool) -> &str {
    if !truncated {
        return text;
    }
    match text.rfind('\n') {
        Some(end) => &text[..=end],
        None => "",
    }
}

fn parse_status_line(line: &str) -> Result<StatusEntry> {
    if let Some(path) = line.strip_prefix("?? ") {
        return Ok(StatusEntry {
            code: "??".to_string(),
            path: path.trim().to_string(),
        });
    }
    if line.len() < 4 {
        return Err(anyhow!("unexpected porcelain line: '{line}'"));
    }
    let code = line[..2].to_string();
    let mut path = line[3..].trim().to_string();
    if let Some((_, new)) = path.split_once("->") {
        path = new.trim().to_string();
    }
    Ok(StatusEntry { code, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_output_keeps_only_complete_lines() {
        let cut = "?? a.txt\n?? b.txt\n??";
        assert_eq!(complete_lines(cut, true), "?? a.txt\n?? b.txt\n");
        assert_eq!(complete_lines(cut, false), cut);
        assert_eq!(complete_lines("?? a.t", true), "");
        let entries = parse_status(complete_lines(cut, true)).expect("parse");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn parses_untracked_line() {
        let e = parse_status_line("?? foo.txt").expect("parse");
        assert_eq!(
            e,
            StatusEntry {
                code: "??".to_string(),
                path: "foo.txt".to_string()
            }
        );
    }

    #[test]
    fn parses_modified_line() {
        let e = parse_status_line(" M src/main.rs").expect("parse");
        assert_eq!(e.index_status(), ' ');
        assert_eq!(e.worktree_status(), 'M');
        assert_eq!(e.path, "src/main.rs");
    }

    #[test]
    fn parses_rename_line_uses_new_path() {
        let e = parse_status_line("R  old.txt -> new.txt").expect("parse");
        assert_eq!(e.path, "new.txt");
        assert_eq!(e.index_status(), 'R');
    }

    #[test]
    fn parse_status_skips_blank_lines() {
        let entries = parse_status("D  gone.rs\n\nA  new.rs\n").expect("parse");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index_status(), 'D');
        assert_eq!(entries[1].path, "new.rs");
    }
}
