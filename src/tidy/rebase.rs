//! Rebase-merge detection.
//!
//! When a branch is rebased onto the target and its commits land one by
//! one, neither ancestry nor a single squash commit describes it. `git
//! cherry` does: it matches each of the branch's commits against the
//! target's by patch id.
//!
//! Patch ids ignore whitespace, so a match is only trusted once every path
//! the branch touched holds the same content on the target.

use super::{Branch, RepositoryFacade};

/// True if every commit unique to `branch` has a patch-equivalent commit on
/// `target` and `target` leaves every path the branch changed in the state
/// the branch left it. A branch with no unique commits is not "rebased";
/// ancestry already covers it.
pub fn is_rebased(
    repo: &impl RepositoryFacade,
    branch: &Branch,
    target: &str,
) -> anyhow::Result<bool> {
    if !repo
        .cherry_all_equivalent(target, &branch.tip)?
        .unwrap_or(false)
    {
        log::debug!("{} has commits with no equivalent in {target}", branch.name);
        return Ok(false);
    }

    let Some(merge_base) = repo.merge_base(&branch.tip, target)? else {
        return Ok(false);
    };
    let changed = repo.diff_trees(&merge_base, &branch.tip)?;
    let differing = repo.diff_trees(&branch.tip, target)?;
    if let Some(path) = changed.paths().find(|path| differing.get(path).is_some()) {
        log::debug!(
            "{} matches {target} by patch but {path} differs",
            branch.name
        );
        return Ok(false);
    }

    log::debug!("{} rebased onto {target}", branch.name);
    Ok(true)
}
