//! Orchestration for `commitai commit`: proposal document → commits.

use anyhow::Result;
use tracing::instrument;

use crate::core::grouping::group_proposals;
use crate::core::normalize::normalize_document;
use crate::core::types::{BatchResult, CommitOutcome, CommitStatus, MergedGroup};
use crate::io::backend::Backend;
use crate::io::confirm::Confirmer;
use crate::orchestrate::execute_batch;

/// Normalize and group a proposal document.
///
/// Input errors are fatal here, before anything touches the backend.
pub fn plan_commits(raw: &str) -> Result<Vec<MergedGroup>> {
    let proposals = normalize_document(raw)?;
    Ok(group_proposals(&proposals))
}

/// Plan and execute a proposal document.
#[instrument(skip_all, fields(input_bytes = raw.len()))]
pub fn commit_document<B: Backend + ?Sized>(
    raw: &str,
    confirmer: Option<&dyn Confirmer>,
    backend: &B,
) -> Result<BatchResult> {
    let groups = plan_commits(raw)?;
    Ok(execute_batch(groups, confirmer, backend))
}

/// One report block per outcome. Returns `(text, is_error)` so callers can
/// route failures to stderr.
pub fn format_outcome(outcome: &CommitOutcome) -> (String, bool) {
    let subject = outcome.group.primary_message();
    let files = outcome.group.files.join(", ");
    match outcome.status {
        CommitStatus::Success => (format!("✓ Committed: {subject}\n  Files: {files}"), false),
        CommitStatus::Skipped => (
            format!("- Skipped: {subject} ({})\n  Files: {files}", outcome.detail),
            false,
        ),
        CommitStatus::Failed => (
            format!(
                "✗ Failed: {subject}\n  Files: {files}\n  Error: {}",
                outcome.detail.trim()
            ),
            true,
        ),
    }
}

pub fn format_summary(result: &BatchResult) -> String {
    let summary = result.summary;
    format!(
        "Summary: {} successful, {} failed, {} skipped",
        summary.success, summary.failed, summary.skipped
    )
}

/// Print outcome blocks and the summary line.
pub fn print_report(result: &BatchResult) {
    for outcome in &result.outcomes {
        let (text, is_error) = format_outcome(outcome);
        if is_error {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
    println!("\n{}", format_summary(result));
}
