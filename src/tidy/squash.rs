//! Squash-merge detection.
//!
//! A squash merge lands a branch's net change on the target as one new
//! commit, so ancestry says nothing. Instead we compare tree states: the
//! branch's cumulative change since its merge base with the target, against
//! each commit the target gained since that merge base.
//!
//! Two changes are equivalent when they touch the same paths and leave each
//! path with the same content and mode. Commit ids, messages, authors, and
//! what the paths held beforehand are irrelevant, which is what lets a squash
//! commit match even after the target moved on underneath it. Content is
//! compared by blob id, so a merely similar change never matches.

use super::{Branch, RepositoryFacade};

/// The commit on `target` that reproduces `branch`'s net change, if any.
///
/// Returns `None` without scanning when the branch has no changes of its own
/// (its tip is the merge base, or its commits cancel out), and for unrelated
/// histories. Scanning is newest first, so the most recent equivalent commit
/// wins. Root and merge commits on the target are never candidates.
pub fn is_squashed(
    repo: &impl RepositoryFacade,
    branch: &Branch,
    target: &str,
) -> anyhow::Result<Option<String>> {
    let Some(merge_base) = repo.merge_base(&branch.tip, target)? else {
        log::debug!("{} shares no history with {target}", branch.name);
        return Ok(None);
    };
    if merge_base == branch.tip {
        return Ok(None);
    }

    let branch_delta = repo.diff_trees(&merge_base, &branch.tip)?;
    if branch_delta.is_empty() {
        log::debug!("{} nets out to no change since {merge_base}", branch.name);
        return Ok(None);
    }

    for commit in repo.commits_between(&merge_base, target)? {
        if commit.is_root() || commit.is_merge() {
            continue;
        }
        let parent = &commit.parents[0];

        // When the commit was made directly on the merge base, equal deltas
        // mean equal trees, which is a single cheap comparison.
        let equivalent = if repo.trees_equal(parent, &merge_base)? {
            repo.trees_equal(&commit.id, &branch.tip)?
        } else {
            let delta = repo.diff_trees(parent, &commit.id)?;
            delta.len() == branch_delta.len() && delta == branch_delta
        };

        if equivalent {
            log::debug!("{} squashed into {target} as {}", branch.name, commit.id);
            return Ok(Some(commit.id));
        }
    }

    Ok(None)
}
