//! tidybranch error types and formatting
//!
//! **`GitError`** is a typed enum for domain errors that can be
//! pattern-matched and tested. Use `.into()` to convert to `anyhow::Error`
//! while preserving the type for `downcast_ref`. Display produces styled
//! output for users.
//!
//! Every fatal workflow error names the step that was running, so a failed
//! `finish` always says whether it stopped while updating remotes, syncing
//! the primary branch, switching to it, or deleting.

use std::path::PathBuf;

use color_print::cformat;

use crate::styling::{
    error_message, format_with_gutter, hint_message, suggest_command, warning_message,
};

/// Domain errors for git and workflow operations.
///
/// ```ignore
/// return Err(GitError::CheckoutFailed { branch: "main".into(), error }.into());
///
/// if let Some(GitError::SyncFailed { branch, .. }) = err.downcast_ref() {
///     println!("{branch} diverged");
/// }
/// ```
#[derive(Debug, Clone)]
pub enum GitError {
    /// A config key is unset and could not be detected.
    ConfigMissing {
        /// Config key without section, e.g. `default-branch`
        key: String,
        reason: String,
    },
    FetchFailed {
        remote: String,
        error: String,
    },
    SyncFailed {
        branch: String,
        /// Remote-tracking ref the branch should have fast-forwarded to
        upstream: String,
        error: String,
    },
    CheckoutFailed {
        branch: String,
        error: String,
    },
    /// The deletion step was handed the branch that is checked out.
    DeleteCheckedOut {
        branch: String,
    },
    /// Not fatal: reported as a warning while the run carries on.
    DetachedHead {
        /// What the run does instead, e.g. `nothing is deferred`
        action: Option<String>,
    },
    NotARepository {
        path: PathBuf,
    },
    Other {
        message: String,
    },
}

impl std::error::Error for GitError {}

impl std::fmt::Display for GitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitError::ConfigMissing { key, reason } => {
                let cmd = suggest_command(&format!("config {key}"), &["<name>"], &[]);
                write!(
                    f,
                    "{}\n{}",
                    error_message(cformat!("Cannot determine <bold>{key}</>: {reason}")),
                    hint_message(cformat!("To set it explicitly, run <bright-black>{cmd}</>"))
                )
            }

            GitError::FetchFailed { remote, error } => {
                let header = error_message(cformat!(
                    "Aborted while updating remotes: fetch from <bold>{remote}</> failed"
                ));
                write!(f, "{}", format_error_block(header, error))
            }

            GitError::SyncFailed {
                branch,
                upstream,
                error,
            } => {
                let header = error_message(cformat!(
                    "Aborted while syncing <bold>{branch}</>: cannot fast-forward to <bold>{upstream}</>"
                ));
                write!(
                    f,
                    "{}\n{}",
                    format_error_block(header, error),
                    hint_message(cformat!(
                        "Reconcile <bold>{branch}</> with <bold>{upstream}</> manually; no branches were deleted"
                    ))
                )
            }

            GitError::CheckoutFailed { branch, error } => {
                let header = error_message(cformat!(
                    "Aborted while switching to <bold>{branch}</>"
                ));
                write!(
                    f,
                    "{}\n{}",
                    format_error_block(header, error),
                    hint_message("Commit or stash changes first; no branches were deleted")
                )
            }

            GitError::DeleteCheckedOut { branch } => {
                write!(
                    f,
                    "{}",
                    error_message(cformat!(
                        "Aborted while deleting branches: <bold>{branch}</> is checked out"
                    ))
                )
            }

            GitError::DetachedHead { action } => {
                let message = match action {
                    Some(action) => format!("Not on a branch (detached HEAD); {action}"),
                    None => "Not on a branch (detached HEAD)".to_string(),
                };
                write!(f, "{}", warning_message(message))
            }

            GitError::NotARepository { path } => {
                write!(
                    f,
                    "{}",
                    error_message(cformat!(
                        "Not a git repository: <bold>{}</>",
                        path.display()
                    ))
                )
            }

            GitError::Other { message } => {
                write!(f, "{}", error_message(message))
            }
        }
    }
}

/// Format an error with header and gutter content
fn format_error_block(header: impl Into<String>, error: &str) -> String {
    let header = header.into();
    let trimmed = error.trim();
    if trimmed.is_empty() {
        header
    } else {
        format!("{header}\n{}", format_with_gutter(trimmed, None))
    }
}
