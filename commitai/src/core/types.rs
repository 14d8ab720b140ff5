//! Shared deterministic types for commitai core logic.
//!
//! These types define stable contracts between the normalizer, the grouping
//! engine and the orchestrator. They do not depend on external state or I/O.

use serde::{Deserialize, Serialize};

/// One candidate commit as proposed by the reasoning service, after
/// normalization.
///
/// `files` is non-empty and free of duplicates; `messages` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub files: Vec<String>,
    pub messages: Vec<String>,
}

impl Proposal {
    pub fn new<F, M>(files: F, messages: M) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reconciled, non-overlapping commit unit produced by the grouping engine.
///
/// Serializes to the same `{files, messages}` shape the normalizer accepts,
/// so `generate` output can be fed straight back into `commit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedGroup {
    pub files: Vec<String>,
    pub messages: Vec<String>,
}

impl MergedGroup {
    /// First message; used as the commit subject.
    pub fn primary_message(&self) -> &str {
        self.messages.first().map(String::as_str).unwrap_or_default()
    }
}

/// Terminal status of one merged group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatus {
    Success,
    Failed,
    Skipped,
}

/// Result of realizing one merged group against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitOutcome {
    pub group: MergedGroup,
    pub status: CommitStatus,
    /// Backend output on success, error text on failure, or the skip reason.
    pub detail: String,
}

/// Per-status tally of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn record(&mut self, status: CommitStatus) {
        match status {
            CommitStatus::Success => self.success += 1,
            CommitStatus::Failed => self.failed += 1,
            CommitStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Ordered outcomes (one per group, in group order) plus their tally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub outcomes: Vec<CommitOutcome>,
    pub summary: BatchSummary,
}

impl BatchResult {
    pub fn push(&mut self, outcome: CommitOutcome) {
        self.summary.record(outcome.status);
        self.outcomes.push(outcome);
    }

    /// True iff at least one group failed. Skipped groups do not count.
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Wire shape printed by `generate`: `{"commits": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedCommits {
    pub commits: Vec<MergedGroup>,
}
