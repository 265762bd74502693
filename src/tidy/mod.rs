//! Branch classification and safe deletion.
//!
//! The engine works against [`RepositoryFacade`], a narrow capability
//! interface over a repository. [`crate::git::Repository`] implements it by
//! shelling out to git; unit tests use an in-memory fake.
//!
//! A run is: snapshot the local branches into a [`CandidateSet`], classify
//! each candidate ([`classify`]), delete the ones that are safe
//! ([`delete`]), and collect the [`DeletionOutcome`]s into a summary.
//! [`workflow`] sequences that with remote updates and primary-branch sync.

use std::path::PathBuf;

use serde::Serialize;

use crate::git::{CommitInfo, TreeDelta, WorktreeHead};

pub mod classify;
pub mod delete;
pub mod merge;
pub mod rebase;
pub mod squash;
pub mod workflow;


pub use classify::{Classified, Disposition, Target, classify, integration_target};
pub use delete::{BranchOutcome, DeleteFailure, DeleteFailureKind, DeleteOptions, DeletionOutcome, SkipReason, delete};
pub use workflow::{Command, RunSummary, Workflow, WorkflowOptions, WorkflowState};

/// Primitives the engine needs from a repository.
///
/// Commit arguments accept anything git can resolve (branch names, remote
/// refs, object ids). Implementations return typed [`crate::git::GitError`]s
/// for failures the workflow treats as fatal (`fetch_and_prune`,
/// `checkout`, `fast_forward`).
pub trait RepositoryFacade {
    fn list_local_branches(&self) -> anyhow::Result<Vec<Branch>>;

    fn list_remotes(&self) -> anyhow::Result<Vec<String>>;

    fn fetch_and_prune(&self, remote: &str) -> anyhow::Result<()>;

    /// Best common ancestor, or `None` for unrelated histories.
    fn merge_base(&self, a: &str, b: &str) -> anyhow::Result<Option<String>>;

    /// True if `ancestor` is reachable from `descendant` (or equal to it).
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> anyhow::Result<bool>;

    /// Commits reachable from `tip` but not from `base`, newest first.
    fn commits_between(&self, base: &str, tip: &str) -> anyhow::Result<Vec<CommitInfo>>;

    /// Net tree change from `from` to `to`.
    fn diff_trees(&self, from: &str, to: &str) -> anyhow::Result<TreeDelta>;

    fn trees_equal(&self, a: &str, b: &str) -> anyhow::Result<bool>;

    /// `None` on a detached HEAD.
    fn current_branch(&self) -> anyhow::Result<Option<String>>;

    fn checkout(&self, branch: &str) -> anyhow::Result<()>;

    fn delete_branch(&self, branch: &str) -> anyhow::Result<()>;

    /// Tip of `<remote>/<branch>`, if that remote-tracking ref exists.
    fn resolve_remote_tracking_tip(
        &self,
        branch: &str,
        remote: &str,
    ) -> anyhow::Result<Option<String>>;

    /// Whether every commit in `upstream..head` has a patch-equivalent commit
    /// in `head..upstream`. `None` when `head` has no unique commits.
    fn cherry_all_equivalent(&self, upstream: &str, head: &str) -> anyhow::Result<Option<bool>>;

    /// Branches checked out in any worktree, including the current one.
    fn worktree_branches(&self) -> anyhow::Result<Vec<WorktreeHead>>;

    /// Move `branch` forward to `target`. The caller has already verified the
    /// move is a fast-forward.
    fn fast_forward(&self, branch: &str, target: &str) -> anyhow::Result<()>;
}

/// Snapshot of a local branch taken at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: String,
    pub tip: String,
    pub upstream: Option<String>,
}

/// What one invocation operates on. Resolved once, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub primary: String,
    pub remote: Option<String>,
    pub current: Option<String>,
}

impl RepositoryContext {
    /// `<remote>/<primary>`, when a remote is configured.
    pub fn remote_primary(&self) -> Option<String> {
        self.remote
            .as_deref()
            .map(|remote| format!("{remote}/{}", self.primary))
    }
}

/// Local branches eligible for classification.
///
/// The primary branch is never a member. The checked-out branch is held in
/// `deferred` and branches checked out in other worktrees in `in_worktrees`:
/// they are classified so the summary can say they were skipped, but never
/// handed to the deletion step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub branches: Vec<Branch>,
    pub deferred: Option<Branch>,
    pub in_worktrees: Vec<(Branch, PathBuf)>,
}

impl CandidateSet {
    /// Partition `branches` for a context.
    ///
    /// `worktrees` lists every checked-out branch; the entry for the current
    /// branch is ignored since it is already `deferred`.
    pub fn build(
        branches: Vec<Branch>,
        context: &RepositoryContext,
        worktrees: &[WorktreeHead],
    ) -> Self {
        let mut set = Self::default();
        for branch in branches {
            if branch.name == context.primary {
                continue;
            }
            if context.current.as_deref() == Some(branch.name.as_str()) {
                set.deferred = Some(branch);
                continue;
            }
            if let Some(wt) = worktrees.iter().find(|wt| wt.branch == branch.name) {
                set.in_worktrees.push((branch, wt.path.clone()));
                continue;
            }
            set.branches.push(branch);
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.deferred.is_none() && self.in_worktrees.is_empty()
    }
}
