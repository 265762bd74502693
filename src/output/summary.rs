//! Human-readable report of a run.

use color_print::cformat;
use tidybranch::styling::{
    error_message, format_branches, format_with_gutter, info_message, plural, success_message,
    warning_message,
};
use tidybranch::tidy::{Command, DeletionOutcome, RunSummary, SkipReason};

/// One message per line of the report, in display order.
///
/// Notices come first, then remote updates, then one line per deletable
/// branch (sorted by name) and one per kept branch.
pub fn render(summary: &RunSummary) -> Vec<String> {
    let mut messages: Vec<String> = summary.notices.iter().map(ToString::to_string).collect();

    if !summary.remotes_updated.is_empty() {
        messages.push(
            success_message(cformat!(
                "Updated {}: {}",
                plural(summary.remotes_updated.len(), "remote", "remotes"),
                format_branches(&summary.remotes_updated)
            ))
            .into(),
        );
    } else if summary.command == Command::Update {
        messages.push(info_message("No remotes to update").into());
    }

    let Some(target) = &summary.target else {
        return messages;
    };

    for outcome in &summary.outcomes {
        let branch = outcome.name();
        let reason = &outcome.classified.reason;
        let message: String = match &outcome.outcome {
            DeletionOutcome::Deleted => {
                success_message(cformat!("Deleted <bold>{branch}</> ({reason})")).into()
            }
            DeletionOutcome::Skipped(SkipReason::DryRun) => {
                info_message(cformat!("Would delete <bold>{branch}</> ({reason})")).into()
            }
            DeletionOutcome::Skipped(SkipReason::CheckedOut) => warning_message(cformat!(
                "Not deleting <bold>{branch}</> ({reason}): it is checked out"
            ))
            .into(),
            DeletionOutcome::Skipped(SkipReason::InWorktree { path }) => {
                warning_message(cformat!(
                    "Not deleting <bold>{branch}</> ({reason}): checked out in worktree at <bold>{}</>",
                    path.display()
                ))
                .into()
            }
            DeletionOutcome::Failed(failure) => format!(
                "{}\n{}",
                error_message(cformat!("Failed to delete <bold>{branch}</>")),
                format_with_gutter(&failure.message, None)
            ),
        };
        messages.push(message);
    }

    for kept in &summary.kept {
        messages.push(
            info_message(cformat!(
                "Kept <bold>{}</> ({})",
                kept.branch.name,
                kept.reason
            ))
            .into(),
        );
    }

    if summary.outcomes.is_empty() {
        messages.push(
            info_message(cformat!(
                "No branches have been merged into <bold>{}</>",
                target.name
            ))
            .into(),
        );
    } else if summary.dry_run {
        messages.push(info_message("Dry run; no branches were deleted").into());
    }

    messages
}
