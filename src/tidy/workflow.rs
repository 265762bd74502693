//! Command sequencing.
//!
//! Every command walks the same chain of states, skipping the ones it has no
//! use for:
//!
//! ```text
//! Idle → RemotesUpdated → PrimaryResolved → PrimarySynced → SwitchedToPrimary
//!      → Classified → Deleted → Done
//! ```
//!
//! `update` stops after `RemotesUpdated`, `tidy` skips the sync and switch,
//! `finish` walks all of it, and `--no-update` skips `RemotesUpdated`.
//! Nothing is deleted unless every earlier step succeeded.

use std::path::PathBuf;

use serde::Serialize;

use super::classify::{Target, classify, integration_target};
use super::delete::{BranchOutcome, DeleteOptions, DeletionOutcome, SkipReason, delete};
use super::{CandidateSet, Classified, RepositoryContext, RepositoryFacade};
use crate::git::GitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    Update,
    Tidy,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum WorkflowState {
    Idle,
    RemotesUpdated,
    PrimaryResolved,
    PrimarySynced,
    SwitchedToPrimary,
    Classified,
    Deleted,
    Done,
}

impl WorkflowState {
    fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::RemotesUpdated)
                | (Self::Idle, Self::PrimaryResolved)
                | (Self::RemotesUpdated, Self::PrimaryResolved)
                | (Self::RemotesUpdated, Self::Done)
                | (Self::PrimaryResolved, Self::PrimarySynced)
                | (Self::PrimaryResolved, Self::Classified)
                | (Self::PrimarySynced, Self::SwitchedToPrimary)
                | (Self::SwitchedToPrimary, Self::Classified)
                | (Self::Classified, Self::Deleted)
                | (Self::Deleted, Self::Done)
        )
    }

    /// What a run is doing while it works toward this state.
    pub fn activity(self) -> &'static str {
        match self {
            Self::Idle => "starting",
            Self::RemotesUpdated => "updating remotes",
            Self::PrimaryResolved => "resolving the primary branch",
            Self::PrimarySynced => "syncing the primary branch",
            Self::SwitchedToPrimary => "switching to the primary branch",
            Self::Classified => "classifying branches",
            Self::Deleted => "deleting branches",
            Self::Done => "finishing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Fetch and prune every remote first
    pub update: bool,
    pub dry_run: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            update: true,
            dry_run: false,
        }
    }
}

/// Everything a run did, for display.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub command: Command,
    pub dry_run: bool,
    pub remotes_updated: Vec<String>,
    /// What branches were checked against; absent for `update`
    pub target: Option<Target>,
    /// One entry per deletable branch, sorted by name
    pub outcomes: Vec<BranchOutcome>,
    pub kept: Vec<Classified>,
    /// Non-fatal conditions worth telling the user about
    #[serde(skip)]
    pub notices: Vec<GitError>,
}

impl RunSummary {
    fn new(command: Command, dry_run: bool) -> Self {
        Self {
            command,
            dry_run,
            remotes_updated: Vec::new(),
            target: None,
            outcomes: Vec::new(),
            kept: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn deleted(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, DeletionOutcome::Deleted))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, DeletionOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> impl Iterator<Item = &BranchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, DeletionOutcome::Failed(_)))
    }
}

/// Every branch checked against the target, grouped by how it was found.
struct Classification {
    target: Target,
    candidates: Vec<Classified>,
    deferred: Vec<Classified>,
    in_worktrees: Vec<(Classified, PathBuf)>,
}

/// One invocation of a command against a repository.
pub struct Workflow<'a, R: RepositoryFacade> {
    repo: &'a R,
    command: Command,
    options: WorkflowOptions,
    state: WorkflowState,
    trace: Vec<WorkflowState>,
}

impl<'a, R: RepositoryFacade> Workflow<'a, R> {
    pub fn new(repo: &'a R, command: Command, options: WorkflowOptions) -> Self {
        Self {
            repo,
            command,
            options,
            state: WorkflowState::Idle,
            trace: vec![WorkflowState::Idle],
        }
    }

    /// The last state reached. After a failure, the state before the step
    /// that failed.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Every state reached so far, in order.
    pub fn trace(&self) -> &[WorkflowState] {
        &self.trace
    }

    fn advance(&mut self, next: WorkflowState) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.state.can_advance_to(next),
            "{} cannot move from {} to {next}",
            self.command,
            self.state
        );
        log::info!("{}: {} → {next}", self.command, self.state);
        self.state = next;
        self.trace.push(next);
        Ok(())
    }

    /// Run the command to completion.
    ///
    /// `resolve` supplies the repository context. It is called once, after
    /// remotes are updated, and never for `update`. A failure names the state
    /// the run was working toward.
    pub fn run(
        &mut self,
        resolve: impl FnOnce() -> anyhow::Result<RepositoryContext>,
    ) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::new(self.command, self.options.dry_run);

        if self.options.update || self.command == Command::Update {
            summary.remotes_updated =
                self.step(WorkflowState::RemotesUpdated, self.update_remotes())?;
            self.advance(WorkflowState::RemotesUpdated)?;
        }
        if self.command == Command::Update {
            self.advance(WorkflowState::Done)?;
            return Ok(summary);
        }

        let context = self.step(WorkflowState::PrimaryResolved, resolve())?;
        self.advance(WorkflowState::PrimaryResolved)?;

        if self.command == Command::Finish {
            self.step(WorkflowState::PrimarySynced, self.sync_primary(&context))?;
            self.advance(WorkflowState::PrimarySynced)?;
            if context.current.is_none() {
                summary.notices.push(GitError::DetachedHead {
                    action: Some("nothing is deferred".into()),
                });
            }
            self.step(
                WorkflowState::SwitchedToPrimary,
                self.switch_to_primary(&context),
            )?;
            self.advance(WorkflowState::SwitchedToPrimary)?;
        }

        let classification =
            self.step(WorkflowState::Classified, self.classify_all(context))?;
        self.advance(WorkflowState::Classified)?;

        let outcomes = self.step(WorkflowState::Deleted, self.delete_all(&classification))?;
        self.advance(WorkflowState::Deleted)?;

        let Classification {
            target,
            candidates,
            deferred,
            ..
        } = classification;
        summary.kept = candidates
            .into_iter()
            .chain(deferred)
            .filter(|c| !c.disposition.is_deletable())
            .collect();
        summary.target = Some(target);
        summary.outcomes = outcomes;
        self.advance(WorkflowState::Done)?;
        Ok(summary)
    }

    /// Attach the state being worked toward to a failed step.
    ///
    /// Errors that already say which step they stopped in pass through as-is.
    fn step<T>(&self, next: WorkflowState, result: anyhow::Result<T>) -> anyhow::Result<T> {
        result.map_err(|e| {
            if matches!(
                e.downcast_ref::<GitError>(),
                Some(
                    GitError::FetchFailed { .. }
                        | GitError::SyncFailed { .. }
                        | GitError::CheckoutFailed { .. }
                        | GitError::DeleteCheckedOut { .. }
                )
            ) {
                return e;
            }
            log::debug!("{} failed in {} on the way to {next}", self.command, self.state);
            e.context(format!(
                "Aborted while {}: {} did not reach {next}",
                next.activity(),
                self.command
            ))
        })
    }

    fn classify_all(&self, context: RepositoryContext) -> anyhow::Result<Classification> {
        let branches = self.repo.list_local_branches()?;
        let target = integration_target(self.repo, &context, &branches)?;
        // After `finish` switched, the branch it left is an ordinary candidate
        let context = RepositoryContext {
            current: self.repo.current_branch()?,
            ..context
        };
        let worktrees = self.repo.worktree_branches()?;
        let set = CandidateSet::build(branches, &context, &worktrees);

        let candidates = classify(self.repo, &set.branches, &target)?;
        let deferred = classify(self.repo, set.deferred.as_slice(), &target)?;
        let mut in_worktrees = Vec::new();
        for (branch, path) in &set.in_worktrees {
            for classified in classify(self.repo, std::slice::from_ref(branch), &target)? {
                in_worktrees.push((classified, path.clone()));
            }
        }
        Ok(Classification {
            target,
            candidates,
            deferred,
            in_worktrees,
        })
    }

    /// Delete what is safe and report the rest, sorted by branch name.
    fn delete_all(&self, classification: &Classification) -> anyhow::Result<Vec<BranchOutcome>> {
        let options = DeleteOptions {
            dry_run: self.options.dry_run,
        };
        let mut outcomes = delete(self.repo, &classification.candidates, &options)?;
        outcomes.extend(
            classification
                .deferred
                .iter()
                .filter(|c| c.disposition.is_deletable())
                .map(|c| BranchOutcome {
                    classified: c.clone(),
                    outcome: DeletionOutcome::Skipped(SkipReason::CheckedOut),
                }),
        );
        outcomes.extend(
            classification
                .in_worktrees
                .iter()
                .filter(|(c, _)| c.disposition.is_deletable())
                .map(|(c, path)| BranchOutcome {
                    classified: c.clone(),
                    outcome: DeletionOutcome::Skipped(SkipReason::InWorktree {
                        path: path.clone(),
                    }),
                }),
        );
        outcomes.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(outcomes)
    }

    /// Fetch and prune every remote, stopping at the first failure.
    fn update_remotes(&self) -> anyhow::Result<Vec<String>> {
        let remotes = self.repo.list_remotes()?;
        if remotes.is_empty() {
            log::info!("No remotes to update");
        }
        for remote in &remotes {
            self.repo.fetch_and_prune(remote)?;
        }
        Ok(remotes)
    }

    /// Fast-forward the primary branch to its remote-tracking ref.
    fn sync_primary(&self, context: &RepositoryContext) -> anyhow::Result<()> {
        let primary = &context.primary;
        let (Some(remote), Some(upstream)) = (&context.remote, context.remote_primary()) else {
            log::info!("No remote configured; not syncing {primary}");
            return Ok(());
        };
        let Some(remote_tip) = self.repo.resolve_remote_tracking_tip(primary, remote)? else {
            log::warn!("{upstream} does not exist; not syncing {primary}");
            return Ok(());
        };
        let Some(local) = self
            .repo
            .list_local_branches()?
            .into_iter()
            .find(|b| &b.name == primary)
        else {
            return Err(GitError::SyncFailed {
                branch: primary.clone(),
                upstream,
                error: format!("branch '{primary}' does not exist"),
            }
            .into());
        };

        if local.tip == remote_tip || self.repo.is_ancestor(&remote_tip, &local.tip)? {
            log::info!("{primary} is up to date with {upstream}");
            return Ok(());
        }
        if !self.repo.is_ancestor(&local.tip, &remote_tip)? {
            let error = format!("{primary} and {upstream} have diverged");
            return Err(GitError::SyncFailed {
                branch: primary.clone(),
                upstream,
                error,
            }
            .into());
        }
        log::info!("Fast-forwarding {primary} to {upstream}");
        self.repo.fast_forward(primary, &upstream)
    }

    fn switch_to_primary(&self, context: &RepositoryContext) -> anyhow::Result<()> {
        if context.current.as_deref() == Some(context.primary.as_str()) {
            log::info!("Already on {}", context.primary);
            return Ok(());
        }
        self.repo.checkout(&context.primary)
    }
}
