//! Diff collection for the reasoning service.
//!
//! Prefers staged changes; falls back to unstaged ones when nothing is
//! staged. The report bundles porcelain status, a per-kind file summary,
//! name-status and the patch itself.

use std::io::Read;

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};

use crate::io::git::{Git, StatusEntry};
use crate::io::process::CommandLimits;

pub const NO_CHANGES: &str =
    "No changes detected. Please stage your changes with \"git add\" or make some changes first.";

/// Stands in for an empty patch when the staged changes are all deletions.
const ONLY_DELETIONS: &str = "(only file deletions are staged; no content changes)\n";

/// Which side of the index the diff came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffScope {
    Staged,
    Unstaged,
    /// Supplied by the caller rather than collected from git.
    Stdin,
}

impl DiffScope {
    fn label(self) -> &'static str {
        match self {
            DiffScope::Staged => "Staged",
            DiffScope::Unstaged => "Unstaged",
            DiffScope::Stdin => "Stdin",
        }
    }
}

/// Diff text ready to hand to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffReport {
    pub scope: DiffScope,
    pub text: String,
}

/// Collect the working-tree diff through `git`.
#[instrument(skip_all, fields(workdir = %git.workdir().display()))]
pub fn collect_diff(git: &Git, limits: CommandLimits) -> Result<DiffReport> {
    let (status, entries) = git
        .status_text(limits)
        .context("Error running git commands. Make sure you are in a git repository")?;
    let staged_diff = git.diff_text(true, false, limits)?;
    let staged_names = git.diff_text(true, true, limits)?;

    if !staged_diff.trim().is_empty() || !staged_names.trim().is_empty() {
        debug!(bytes = staged_diff.len(), "using staged diff");
        let patch = if staged_diff.trim().is_empty() {
            ONLY_DELETIONS
        } else {
            staged_diff.as_str()
        };
        return Ok(DiffReport {
            scope: DiffScope::Staged,
            text: render_report(&status, &entries, DiffScope::Staged, &staged_names, patch),
        });
    }

    let unstaged_diff = git.diff_text(false, false, limits)?;
    let has_unstaged_deletions = entries.iter().any(|e| e.worktree_status() == 'D');
    if unstaged_diff.trim().is_empty() && !has_unstaged_deletions {
        bail!(NO_CHANGES);
    }
    let name_status = git.diff_text(false, true, limits)?;
    debug!(bytes = unstaged_diff.len(), "using unstaged diff");
    Ok(DiffReport {
        scope: DiffScope::Unstaged,
        text: render_report(
            &status,
            &entries,
            DiffScope::Unstaged,
            &name_status,
            &unstaged_diff,
        ),
    })
}

/// Read diff text supplied on a stream (e.g. `--stdin`).
pub fn read_diff<R: Read>(mut reader: R) -> Result<DiffReport> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("read diff from stdin")?;
    if text.trim().is_empty() {
        bail!("No diff content provided");
    }
    Ok(DiffReport {
        scope: DiffScope::Stdin,
        text,
    })
}

/// Assemble the report text from already-collected git output.
pub fn render_report(
    status: &str,
    entries: &[StatusEntry],
    scope: DiffScope,
    name_status: &str,
    diff: &str,
) -> String {
    let label = scope.label();
    format!(
        "Git Status:\n{status}\n\n{summary}Git Diff Name Status ({label}):\n{name_status}\n\nGit Diff ({label}):\n{diff}",
        summary = file_summary(entries, scope),
    )
}

/// Deleted/Added/Modified sections for the chosen side of the index.
fn file_summary(entries: &[StatusEntry], scope: DiffScope) -> String {
    let column = |entry: &StatusEntry| match scope {
        DiffScope::Staged | DiffScope::Stdin => entry.index_status(),
        DiffScope::Unstaged => entry.worktree_status(),
    };
    let suffix = match scope {
        DiffScope::Staged | DiffScope::Stdin => "",
        DiffScope::Unstaged => " (unstaged)",
    };
    let mut out = String::new();
    for (code, title) in [('D', "Deleted"), ('A', "Added"), ('M', "Modified")] {
        let paths: Vec<&str> = entries
            .iter()
            .filter(|entry| entry.code != "??" && column(entry) == code)
            .map(|entry| entry.path.as_str())
            .collect();
        if paths.is_empty() {
            continue;
        }
        out.push_str(&format!("{title} files{suffix}:\n"));
        for path in paths {
            out.push_str(&format!("  - {path}\n"));
        }
        out.push('\n');
    }
    out
}
