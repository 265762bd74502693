//! Consolidated styling module for terminal output.
//!
//! This module uses the anstyle ecosystem:
//! - anstream for auto-detecting color support
//! - color-print for inline markup in messages
//!
//! ## stdout vs stderr principle
//!
//! - **stdout**: Primary data output (`config` listing, `--format json`)
//! - **stderr**: Status messages (success, errors, hints, warnings)
//!
//! This separation allows piping (`tidybranch config | grep remote`) without
//! status messages interfering.

mod constants;
mod format;

// Re-exports from anstream (auto-detecting output)
pub use anstream::{eprint, eprintln, print, println, stderr, stdout};

pub use constants::*;
pub use format::{format_branch, format_branches, format_with_gutter, plural, suggest_command};

/// Get terminal width, or `usize::MAX` if detection fails.
///
/// Checks stderr first (status messages go there), then stdout. Falls back
/// to `COLUMNS`, and finally to no limit so piped output isn't truncated.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) =
        terminal_size::terminal_size_of(std::io::stderr()).or_else(terminal_size::terminal_size)
    {
        return w as usize;
    }

    if let Ok(cols) = std::env::var("COLUMNS")
        && let Ok(width) = cols.parse::<usize>()
    {
        return width;
    }

    usize::MAX
}
