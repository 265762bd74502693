//! `tidybranch tidy`, `finish` and `update`.

use tidybranch::config::resolve_context;
use tidybranch::git::Repository;
use tidybranch::tidy::{Command, RunSummary, Workflow, WorkflowOptions};

use super::print_changes;
use crate::cli::OutputFormat;
use crate::output;

/// Run `tidy` or `finish` and report the result.
///
/// Deletion failures are reported but don't fail the command; only errors
/// that stop the run do.
pub(crate) fn handle_run(
    command: Command,
    options: WorkflowOptions,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let repo = Repository::current();
    repo.ensure_repository()?;

    let mut workflow = Workflow::new(&repo, command, options);
    let summary = workflow.run(|| {
        let resolved = resolve_context(&repo, command)?;
        print_changes(&resolved.changes)?;
        Ok(resolved.context)
    })?;
    report(&summary, format)
}

pub(crate) fn handle_update() -> anyhow::Result<()> {
    let repo = Repository::current();
    repo.ensure_repository()?;

    let mut workflow = Workflow::new(&repo, Command::Update, WorkflowOptions::default());
    let summary = workflow.run(|| anyhow::bail!("update does not resolve a primary branch"))?;
    report(&summary, OutputFormat::Text)
}

fn report(summary: &RunSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => output::print_summary(summary)?,
        OutputFormat::Json => {
            // Notices aren't part of the JSON document; keep them on stderr
            for notice in &summary.notices {
                output::print(notice)?;
            }
            output::print_json(summary)?;
        }
    }
    Ok(())
}
