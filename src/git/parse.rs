//! Parsers for git plumbing output.
//!
//! Each parser takes the raw stdout of one command and is tested directly
//! against representative output, including the awkward cases.

use std::path::PathBuf;

use super::{CommitInfo, GitError, PathState, TreeDelta, WorktreeHead};

/// All-zero object id git prints for the missing side of an add or delete.
const NULL_OID: &str = "0000000000000000000000000000000000000000";

/// A local branch as listed by `for-each-ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawBranch {
    pub name: String,
    pub tip: String,
    pub upstream: Option<String>,
}

/// Parse `git for-each-ref --format='%(refname:lstrip=2) %(objectname) %(upstream:short)' refs/heads/`.
///
/// Branches without an upstream produce a trailing space and only two fields.
pub(crate) fn parse_local_branches(output: &str) -> Vec<RawBranch> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let tip = parts.next()?;
            Some(RawBranch {
                name: name.to_string(),
                tip: tip.to_string(),
                upstream: parts.next().map(str::to_string),
            })
        })
        .collect()
}

/// Parse `git rev-list --parents <range>`: one commit per line, the commit id
/// followed by its parent ids.
pub(crate) fn parse_rev_list_parents(output: &str) -> Vec<CommitInfo> {
    output
        .lines()
        .filter_map(|line| {
            let mut ids = line.split_whitespace();
            let id = ids.next()?;
            Some(CommitInfo {
                id: id.to_string(),
                parents: ids.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Parse `git diff-tree -r -z --no-renames <a> <b>` into a [`TreeDelta`].
///
/// With `-z`, each entry is a metadata field followed by a NUL and the raw
/// path followed by a NUL:
///
/// ```text
/// :100644 100644 <old-oid> <new-oid> M\0src/lib.rs\0
/// ```
pub(crate) fn parse_diff_tree(output: &str) -> Result<TreeDelta, GitError> {
    let mut delta = TreeDelta::new();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(meta) = fields.next() {
        // A leading commit id line appears when diff-tree is given one commit
        let Some(meta) = meta.trim_start_matches('\n').strip_prefix(':') else {
            continue;
        };
        let path = fields.next().ok_or_else(|| {
            GitError::Other {
                message: format!("diff-tree entry without path: {meta}"),
            }
        })?;

        let parts: Vec<&str> = meta.split_whitespace().collect();
        let [_old_mode, new_mode, _old_oid, new_oid, status] = parts.as_slice() else {
            return Err(GitError::Other {
                message: format!("Unexpected diff-tree entry: {meta}"),
            });
        };

        let state = if status.starts_with('D') || *new_oid == NULL_OID {
            PathState::Deleted
        } else {
            PathState::Present {
                mode: (*new_mode).to_string(),
                blob: (*new_oid).to_string(),
            }
        };
        delta.insert(path, state);
    }

    Ok(delta)
}

/// Parse `git cherry <upstream> <head>`.
///
/// Returns `None` when there are no unique commits at all, otherwise whether
/// every commit is marked `-` (has an equivalent upstream).
pub(crate) fn parse_cherry(output: &str) -> Option<bool> {
    let mut markers = output.lines().filter_map(|line| line.chars().next()).peekable();
    markers.peek()?;
    Some(markers.all(|c| c == '-'))
}

/// Parse `git worktree list --porcelain`, keeping only worktrees with a branch.
pub(crate) fn parse_worktree_heads(output: &str) -> Vec<WorktreeHead> {
    let mut heads = Vec::new();
    let mut path: Option<PathBuf> = None;

    for line in output.lines() {
        if line.is_empty() {
            path = None;
            continue;
        }
        let (key, value) = match line.split_once(' ') {
            Some((k, v)) => (k, Some(v)),
            None => (line, None),
        };
        match (key, value) {
            ("worktree", Some(p)) => path = Some(PathBuf::from(p)),
            ("branch", Some(branch_ref)) => {
                if let Some(p) = &path {
                    let branch = branch_ref
                        .strip_prefix("refs/heads/")
                        .unwrap_or(branch_ref)
                        .to_string();
                    heads.push(WorktreeHead {
                        branch,
                        path: p.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    heads
}

/// Parse `git config --local --get-regexp <pattern>`: `section.key value` lines.
pub(crate) fn parse_config_entries(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}
