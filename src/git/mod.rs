//! Git operations and repository management

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

mod error;
mod parse;
mod repository;

pub use error::GitError;
pub use repository::{Repository, set_base_path};

/// A commit together with its parent ids, as listed by `git rev-list --parents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub parents: Vec<String>,
}

impl CommitInfo {
    /// Root commits have nothing to diff against.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// Resulting state of one path after a tree change.
///
/// Blob ids are content hashes, so two `Present` states are equal exactly
/// when the path ends up with the same bytes and mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum PathState {
    Present { mode: String, blob: String },
    Deleted,
}

/// The net effect of going from one tree to another, keyed by path.
///
/// Only post-images are recorded. Two deltas compare equal when they touch
/// the same paths and leave each one in the same state, regardless of which
/// commits produced them or what the paths contained before.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TreeDelta(BTreeMap<String, PathState>);

impl TreeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, state: PathState) {
        self.0.insert(path.into(), state);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, path: &str) -> Option<&PathState> {
        self.0.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl FromIterator<(String, PathState)> for TreeDelta {
    fn from_iter<I: IntoIterator<Item = (String, PathState)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A branch that is checked out in a worktree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeHead {
    pub branch: String,
    pub path: PathBuf,
}
