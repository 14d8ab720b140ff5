//! Sequential execution of merged groups against the backend.
//!
//! Each group runs `Pending → (Confirming) → Staging → Committing → Success`,
//! leaving early to `Skipped` when confirmation is declined or to `Failed`
//! when the backend errors. A group is fully resolved before the next one
//! starts; one group's failure or decline never stops the batch.
//!
//! There is no rollback. If some paths of a group were staged and a later
//! stage or the commit fails, those paths stay staged and the group is
//! reported `Failed` as a whole.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::message::commit_message;
use crate::core::types::{BatchResult, CommitOutcome, CommitStatus, MergedGroup};
use crate::io::backend::Backend;
use crate::io::confirm::{ConfirmRequest, Confirmer};

/// Detail recorded for groups the confirmer rejected.
pub const DECLINED: &str = "declined";

/// Lifecycle of a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPhase {
    Pending,
    Confirming,
    Staging,
    Committing,
    Success,
    Skipped,
    Failed,
}

impl GroupPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Skipped | Self::Failed)
    }
}

/// Apply every group in order, producing exactly one outcome per group.
#[instrument(skip_all, fields(groups = groups.len(), confirm = confirmer.is_some()))]
pub fn execute_batch<B: Backend + ?Sized>(
    groups: Vec<MergedGroup>,
    confirmer: Option<&dyn Confirmer>,
    backend: &B,
) -> BatchResult {
    let total = groups.len();
    let mut result = BatchResult::default();
    for (index, group) in groups.into_iter().enumerate() {
        let outcome = execute_group(group, index + 1, total, confirmer, backend);
        result.push(outcome);
    }
    info!(
        success = result.summary.success,
        failed = result.summary.failed,
        skipped = result.summary.skipped,
        "batch finished"
    );
    result
}

/// Resolve one group to `Success`, `Skipped` or `Failed`.
///
/// `position` is 1-based and only used for display and logging.
#[instrument(skip_all, fields(position, total, files = group.files.len()))]
pub fn execute_group<B: Backend + ?Sized>(
    group: MergedGroup,
    position: usize,
    total: usize,
    confirmer: Option<&dyn Confirmer>,
    backend: &B,
) -> CommitOutcome {
    let message = commit_message(&group);
    let mut phase = GroupPhase::Pending;

    if let Some(confirmer) = confirmer {
        phase = advance(phase, GroupPhase::Confirming);
        let planned_command = backend.planned_command(&message, &group.files);
        let approved = confirmer.confirm(&ConfirmRequest {
            message: &message,
            files: &group.files,
            planned_command: &planned_command,
            position,
            total,
        });
        if !approved {
            advance(phase, GroupPhase::Skipped);
            return CommitOutcome {
                group,
                status: CommitStatus::Skipped,
                detail: DECLINED.to_string(),
            };
        }
    }

    match apply(&group, &message, &mut phase, backend) {
        Ok(output) => {
            advance(phase, GroupPhase::Success);
            CommitOutcome {
                group,
                status: CommitStatus::Success,
                detail: output,
            }
        }
        Err(err) => {
            warn!(phase = ?phase, err = %format!("{err:#}"), "group failed");
            advance(phase, GroupPhase::Failed);
            CommitOutcome {
                group,
                status: CommitStatus::Failed,
                detail: format!("{err:#}"),
            }
        }
    }
}

fn apply<B: Backend + ?Sized>(
    group: &MergedGroup,
    message: &str,
    phase: &mut GroupPhase,
    backend: &B,
) -> Result<String> {
    *phase = advance(*phase, GroupPhase::Staging);
    for file in &group.files {
        backend
            .stage(file)
            .with_context(|| format!("stage {file}"))?;
    }
    *phase = advance(*phase, GroupPhase::Committing);
    backend.commit(message, &group.files).context("commit")
}

fn advance(from: GroupPhase, to: GroupPhase) -> GroupPhase {
    debug_assert!(!from.is_terminal(), "group already resolved");
    debug!(from = ?from, to = ?to, "group transition");
    to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{BackendCall, ScriptedBackend, ScriptedConfirmer};

    fn group(files: &[&str], messages: &[&str]) -> MergedGroup {
        MergedGroup {
            files: files.iter().map(|f| f.to_string()).collect(),
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn commits_with_subject_and_bullets_after_staging_each_file() {
        let backend = ScriptedBackend::succeeding();
        let outcome = execute_group(
            group(&["a", "b"], &["feat: a", "fix: b"]),
            1,
            1,
            None,
            &backend,
        );
        assert_eq!(outcome.status, CommitStatus::Success);
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Stage("a".to_string()),
                BackendCall::Stage("b".to_string()),
                BackendCall::Commit {
                    message: "feat: a\n- fix: b".to_string(),
                    files: vec!["a".to_string(), "b".to_string()],
                },
            ]
        );
        assert!(outcome.detail.contains("committed"));
    }

    #[test]
    fn declined_group_touches_nothing() {
        let backend = ScriptedBackend::succeeding();
        let confirmer = ScriptedConfirmer::new(vec![false]);
        let outcome = execute_group(group(&["a"], &["m"]), 1, 1, Some(&confirmer), &backend);
        assert_eq!(outcome.status, CommitStatus::Skipped);
        assert_eq!(outcome.detail, DECLINED);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn confirmer_sees_message_files_and_planned_command() {
        let backend = ScriptedBackend::succeeding();
        let confirmer = ScriptedConfirmer::new(vec![true]);
        execute_group(
            group(&["x"], &["one", "two"]),
            2,
            3,
            Some(&confirmer),
            &backend,
        );
        let seen = confirmer.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].message, "one\n- two");
        assert_eq!(seen[0].files, vec!["x".to_string()]);
        assert_eq!(seen[0].planned_command, "scripted commit x");
        assert_eq!((seen[0].position, seen[0].total), (2, 3));
    }

    #[test]
    fn stage_failure_marks_group_failed_and_skips_commit() {
        let backend = ScriptedBackend::succeeding().fail_stage("b", "pathspec 'b' did not match");
        let outcome = execute_group(group(&["a", "b", "c"], &["m"]), 1, 1, None, &backend);
        assert_eq!(outcome.status, CommitStatus::Failed);
        assert!(outcome.detail.contains("stage b"));
        assert!(outcome.detail.contains("did not match"));
        // "a" stays staged; nothing is rolled back.
        assert_eq!(
            backend.calls(),
            vec![
                BackendCall::Stage("a".to_string()),
                BackendCall::Stage("b".to_string()),
            ]
        );
    }

    #[test]
    fn skip_is_isolated_to_its_group() {
        let backend = ScriptedBackend::succeeding();
        let confirmer = ScriptedConfirmer::new(vec![true, false, true]);
        let result = execute_batch(
            vec![
                group(&["a"], &["1"]),
                group(&["b"], &["2"]),
                group(&["c"], &["3"]),
            ],
            Some(&confirmer),
            &backend,
        );
        let statuses: Vec<CommitStatus> = result.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                CommitStatus::Success,
                CommitStatus::Skipped,
                CommitStatus::Success
            ]
        );
        assert!(
            !backend
                .calls()
                .iter()
                .any(|call| call.touches("b")),
            "declined group must not reach the backend"
        );
        assert!(!result.has_failures());
        assert_eq!(result.summary.skipped, 1);
    }

    #[test]
    fn commit_failure_does_not_stop_later_groups() {
        let backend = ScriptedBackend::succeeding().fail_commit("first", "hook rejected");
        let result = execute_batch(
            vec![group(&["a"], &["first"]), group(&["b"], &["second"])],
            None,
            &backend,
        );
        assert_eq!(result.outcomes[0].status, CommitStatus::Failed);
        assert!(result.outcomes[0].detail.contains("hook rejected"));
        assert_eq!(result.outcomes[1].status, CommitStatus::Success);
        assert_eq!(result.summary.failed, 1);
        assert_eq!(result.summary.success, 1);
        assert!(result.has_failures());
    }

    #[test]
    fn outcomes_follow_group_order() {
        let backend = ScriptedBackend::succeeding();
        let groups = vec![
            group(&["z"], &["last-file-first"]),
            group(&["a"], &["first-file-last"]),
        ];
        let result = execute_batch(groups.clone(), None, &backend);
        let seen: Vec<MergedGroup> = result.outcomes.into_iter().map(|o| o.group).collect();
        assert_eq!(seen, groups);
    }
}
