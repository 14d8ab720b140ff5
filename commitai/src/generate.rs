//! Orchestration for `commitai generate`: diff → proposals → merged groups.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::grouping::group_proposals;
use crate::core::normalize::normalize_value;
use crate::core::types::{GroupedCommits, MergedGroup};
use crate::io::diff::DiffReport;
use crate::io::reasoner::Reasoner;

/// Ask the reasoning service for proposals and reconcile them.
///
/// Fails when the service errors, when its output is not a recognizable
/// proposal document, or when no usable proposal remains.
#[instrument(skip_all, fields(scope = ?diff.scope, diff_bytes = diff.text.len()))]
pub fn generate_groups<R: Reasoner + ?Sized>(
    diff: &DiffReport,
    reasoner: &R,
) -> Result<Vec<MergedGroup>> {
    let raw = reasoner.propose(&diff.text)?;
    debug!("received raw proposals");
    let proposals = normalize_value(raw).context("reasoning service output")?;
    let groups = group_proposals(&proposals);
    info!(
        proposals = proposals.len(),
        groups = groups.len(),
        "generated commit groups"
    );
    Ok(groups)
}

/// Pretty JSON for stdout; readable back by `commitai commit`.
pub fn render_groups(groups: &[MergedGroup]) -> Result<String> {
    let doc = GroupedCommits {
        commits: groups.to_vec(),
    };
    serde_json::to_string_pretty(&doc).context("serialize commit groups")
}
