//! Deletion of classified branches.
//!
//! Safety is established by the classifier, so deletion is forced (`git
//! branch -D`); `-d` would re-check against HEAD, which is not the target
//! when the run started elsewhere. Each deletion stands alone: one failure
//! is recorded and the rest are still attempted. Nothing is rolled back or
//! retried.

use std::path::PathBuf;

use serde::Serialize;

use super::{Classified, RepositoryFacade};
use crate::git::GitError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Report what would be deleted without touching the repository
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "skip_reason")]
pub enum SkipReason {
    DryRun,
    /// The branch is checked out in the current worktree
    CheckedOut,
    /// The branch is checked out in another worktree
    InWorktree { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeleteFailureKind {
    /// The branch disappeared between snapshot and deletion
    NotFound,
    /// Another worktree checked the branch out in the meantime
    CheckedOutElsewhere,
    Other,
}

impl DeleteFailureKind {
    /// Categorize git's error output.
    pub fn from_message(message: &str) -> Self {
        if message.contains("not found") {
            Self::NotFound
        } else if message.contains("checked out at") || message.contains("used by worktree") {
            Self::CheckedOutElsewhere
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub kind: DeleteFailureKind,
    pub message: String,
}

impl DeleteFailure {
    pub fn from_error(error: &anyhow::Error) -> Self {
        let message = error.to_string().trim().to_string();
        Self {
            kind: DeleteFailureKind::from_message(&message),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum DeletionOutcome {
    Deleted,
    Skipped(SkipReason),
    Failed(DeleteFailure),
}

/// What happened to one deletable branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchOutcome {
    #[serde(flatten)]
    pub classified: Classified,
    pub outcome: DeletionOutcome,
}

impl BranchOutcome {
    pub fn name(&self) -> &str {
        &self.classified.branch.name
    }
}

/// Delete every branch whose disposition allows it.
///
/// `Keep` branches produce no outcome. Fails before touching anything if one
/// of the deletable branches is the checked-out branch: the caller is
/// expected to have set it aside.
pub fn delete(
    repo: &impl RepositoryFacade,
    classified: &[Classified],
    options: &DeleteOptions,
) -> anyhow::Result<Vec<BranchOutcome>> {
    let deletable: Vec<&Classified> = classified
        .iter()
        .filter(|c| c.disposition.is_deletable())
        .collect();

    let current = repo.current_branch()?;
    if let Some(checked_out) = deletable
        .iter()
        .find(|c| current.as_deref() == Some(c.branch.name.as_str()))
    {
        return Err(GitError::DeleteCheckedOut {
            branch: checked_out.branch.name.clone(),
        }
        .into());
    }

    let outcomes = deletable
        .into_iter()
        .map(|c| {
            let outcome = if options.dry_run {
                log::debug!("Would delete {} ({})", c.branch.name, c.reason);
                DeletionOutcome::Skipped(SkipReason::DryRun)
            } else {
                match repo.delete_branch(&c.branch.name) {
                    Ok(()) => {
                        log::debug!("Deleted {} ({})", c.branch.name, c.reason);
                        DeletionOutcome::Deleted
                    }
                    Err(e) => {
                        let failure = DeleteFailure::from_error(&e);
                        log::warn!("Failed to delete {}: {}", c.branch.name, failure.message);
                        DeletionOutcome::Failed(failure)
                    }
                }
            };
            BranchOutcome {
                classified: c.clone(),
                outcome,
            }
        })
        .collect();

    Ok(outcomes)
}
