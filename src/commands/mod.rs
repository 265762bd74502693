pub(crate) mod config;
pub(crate) mod workflow;

pub(crate) use config::{handle_config_init, handle_config_set, handle_config_show};
pub(crate) use workflow::{handle_run, handle_update};

use tidybranch::config::ConfigChange;
use tidybranch::styling::success_message;

use crate::output;

/// Report config writes, one success line each.
pub(crate) fn print_changes(changes: &[ConfigChange]) -> anyhow::Result<()> {
    for change in changes {
        output::print(success_message(change.to_string()))?;
    }
    Ok(())
}
