//! Output for the `tidybranch` binary.
//!
//! Status messages go to stderr, data goes to stdout. Both go through
//! `anstream`, which drops styling when the stream is not a terminal or
//! `NO_COLOR` is set.

mod summary;

use std::fmt::Display;
use std::io::{self, Write};

use tidybranch::tidy::RunSummary;

pub use summary::render;

/// Print a status message to stderr.
pub fn print(message: impl Display) -> io::Result<()> {
    let mut stderr = anstream::stderr().lock();
    writeln!(stderr, "{message}")?;
    stderr.flush()
}

/// Print data to stdout, without adding a newline.
pub fn stdout(content: impl Display) -> io::Result<()> {
    let mut stdout = anstream::stdout().lock();
    write!(stdout, "{content}")?;
    stdout.flush()
}

/// Print the human-readable report of a run to stderr.
pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
    for message in render(summary) {
        print(message)?;
    }
    Ok(())
}

/// Print the run as pretty JSON to stdout.
pub fn print_json(summary: &RunSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    stdout(format!("{json}\n"))?;
    Ok(())
}
