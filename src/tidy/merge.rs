//! Ancestry-based merge detection.

use super::{Branch, RepositoryFacade};

/// True if every commit on `branch` is reachable from `target`.
///
/// A branch at the same commit as the target is trivially merged; that case
/// is answered without asking the repository.
pub fn is_merged(
    repo: &impl RepositoryFacade,
    branch: &Branch,
    target: &str,
    target_tip: &str,
) -> anyhow::Result<bool> {
    if branch.tip == target_tip {
        log::debug!("{} is at the same commit as {target}", branch.name);
        return Ok(true);
    }
    let merged = repo.is_ancestor(&branch.tip, target_tip)?;
    log::debug!("{} ancestor of {target}: {merged}", branch.name);
    Ok(merged)
}
