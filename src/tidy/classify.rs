//! Per-branch classification.
//!
//! Runs the detectors cheapest first and stops at the first that matches:
//! ancestry, then patch equivalence per commit, then squash equivalence.
//! A branch no detector claims is kept.

use serde::Serialize;

use super::merge::is_merged;
use super::rebase::is_rebased;
use super::squash::is_squashed;
use super::{Branch, RepositoryContext, RepositoryFacade};
use crate::git::GitError;

/// Why a branch is (or isn't) safe to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case", tag = "kind")]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Has changes the target doesn't.
    Keep,
    /// Tip is reachable from the target.
    Merged { merge_base: String },
    /// Every unique commit has a patch-equivalent commit on the target.
    Rebased { commits: usize },
    /// Net change reproduced by one commit on the target.
    Squashed { equivalent_commit: String },
}

impl Disposition {
    pub fn is_deletable(&self) -> bool {
        !matches!(self, Self::Keep)
    }

    /// Stable snake_case name, e.g. `squashed`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// The ref branches are checked against, resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    /// Display name, e.g. `main` or `origin/main`
    pub name: String,
    pub tip: String,
}

/// A branch with its disposition. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified {
    pub branch: Branch,
    #[serde(flatten)]
    pub disposition: Disposition,
    pub reason: String,
}

/// Pick what to classify against.
///
/// Normally the local primary branch. When `<remote>/<primary>` exists and is
/// strictly ahead of the local branch, the remote-tracking ref is used
/// instead, so work merged upstream counts before it has been pulled. A
/// missing local primary also falls back to the remote-tracking ref.
pub fn integration_target(
    repo: &impl RepositoryFacade,
    context: &RepositoryContext,
    branches: &[Branch],
) -> anyhow::Result<Target> {
    let local = branches.iter().find(|b| b.name == context.primary);
    let remote = match (&context.remote, context.remote_primary()) {
        (Some(remote), Some(name)) => repo
            .resolve_remote_tracking_tip(&context.primary, remote)?
            .map(|tip| Target { name, tip }),
        _ => None,
    };

    match (local, remote) {
        (Some(local), Some(remote))
            if local.tip != remote.tip && repo.is_ancestor(&local.tip, &remote.tip)? =>
        {
            log::info!(
                "{} is ahead of {}; classifying against it",
                remote.name,
                local.name
            );
            Ok(remote)
        }
        (Some(local), _) => Ok(Target {
            name: local.name.clone(),
            tip: local.tip.clone(),
        }),
        (None, Some(remote)) => Ok(remote),
        (None, None) => Err(GitError::Other {
            message: format!("Primary branch {} does not exist", context.primary),
        }
        .into()),
    }
}

/// Classify every candidate against `target`, in order.
///
/// Classification only reads the repository. If a detector fails for a
/// branch, that branch is kept: an undetermined branch is never deleted.
pub fn classify(
    repo: &impl RepositoryFacade,
    candidates: &[Branch],
    target: &Target,
) -> anyhow::Result<Vec<Classified>> {
    let classified = candidates
        .iter()
        .map(|branch| match classify_one(repo, branch, target) {
            Ok((disposition, reason)) => Classified {
                branch: branch.clone(),
                disposition,
                reason,
            },
            Err(e) => {
                log::warn!("Could not classify {}: {e:#}", branch.name);
                Classified {
                    branch: branch.clone(),
                    disposition: Disposition::Keep,
                    reason: format!("could not be checked against {}", target.name),
                }
            }
        })
        .collect();
    Ok(classified)
}

fn classify_one(
    repo: &impl RepositoryFacade,
    branch: &Branch,
    target: &Target,
) -> anyhow::Result<(Disposition, String)> {
    let name = &target.name;

    if is_merged(repo, branch, name, &target.tip)? {
        let reason = if branch.tip == target.tip {
            format!("same commit as {name}")
        } else {
            format!("already in {name}")
        };
        return Ok((
            Disposition::Merged {
                merge_base: branch.tip.clone(),
            },
            reason,
        ));
    }

    if is_rebased(repo, branch, &target.tip)? {
        let commits = repo.commits_between(&target.tip, &branch.tip)?.len();
        return Ok((
            Disposition::Rebased { commits },
            format!("every commit has an equivalent in {name}"),
        ));
    }

    if let Some(equivalent_commit) = is_squashed(repo, branch, &target.tip)? {
        let reason = format!("squashed into {name} as {}", short_id(&equivalent_commit));
        return Ok((Disposition::Squashed { equivalent_commit }, reason));
    }

    Ok((Disposition::Keep, format!("has changes not in {name}")))
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
