//! `tidybranch config` and its subcommands.

use tidybranch::config::{self, ConfigKey};
use tidybranch::git::Repository;

use super::print_changes;
use crate::output;

/// Print the stored section to stdout.
pub(crate) fn handle_config_show() -> anyhow::Result<()> {
    let repo = Repository::current();
    repo.ensure_repository()?;
    output::stdout(config::listing(&repo)?)?;
    Ok(())
}

/// Detect and store both keys.
pub(crate) fn handle_config_init() -> anyhow::Result<()> {
    let repo = Repository::current();
    repo.ensure_repository()?;
    let changes = config::init(&repo)?;
    print_changes(&changes)
}

pub(crate) fn handle_config_set(key: ConfigKey, value: &str) -> anyhow::Result<()> {
    let repo = Repository::current();
    repo.ensure_repository()?;
    let change = config::set(&repo, key, value)?;
    print_changes(&[change])
}
