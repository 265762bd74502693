mod config;

pub(crate) use config::ConfigCommand;

use clap::builder::styling::{AnsiColor, Color, Styles};
use clap::{Args, Parser, Subcommand};
use tidybranch::tidy::WorkflowOptions;

/// Custom styles for help output - matches tidybranch's message colors
fn help_styles() -> Styles {
    Styles::styled()
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
        )
        .placeholder(anstyle::Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable messages on stderr
    #[default]
    Text,
    /// Run summary as JSON on stdout
    Json,
}

#[derive(Parser)]
#[command(name = "tidybranch")]
#[command(about = "Delete local branches that are already merged", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
#[command(styles = help_styles())]
#[command(arg_required_else_help = true)]
#[command(after_long_help = "\
Getting started

  tidybranch tidy             # Update remotes, delete merged branches
  tidybranch finish           # Sync and switch to the primary branch, then tidy
  tidybranch tidy --dry-run   # Show what would be deleted")]
pub(crate) struct Cli {
    /// Working directory for this command
    #[arg(
        short = 'C',
        global = true,
        value_name = "path",
        display_order = 100,
        help_heading = "Global Options"
    )]
    pub directory: Option<std::path::PathBuf>,

    /// Raise log verbosity; repeat for more (-vvv shows every git command)
    #[arg(
        long,
        short = 'v',
        global = true,
        action = clap::ArgAction::Count,
        display_order = 101,
        help_heading = "Global Options"
    )]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by `tidy` and `finish`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunArgs {
    /// Fetch and prune every remote first [default]
    #[arg(long, overrides_with = "no_update")]
    update: bool,

    /// Use remote-tracking refs as they are
    #[arg(long = "no-update", overrides_with = "update")]
    no_update: bool,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl RunArgs {
    pub fn options(&self) -> WorkflowOptions {
        WorkflowOptions {
            update: self.update || !self.no_update,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Show or change stored settings
    ///
    /// Without a subcommand, prints the `tidybranch` section of the
    /// repository's git config.
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },

    /// Wrap up work on a branch
    ///
    /// Updates remotes, fast-forwards the primary branch, switches to it,
    /// then deletes every branch that is merged into it.
    #[command(after_long_help = "\
Stops before deleting anything if the primary branch cannot be fast-forwarded
or the switch fails. The branch that was checked out is deleted too when it
is merged.")]
    Finish(RunArgs),

    /// Delete branches that are merged into the primary branch
    ///
    /// Branches count as merged when their tip is in the primary branch, when
    /// each of their commits was rebased onto it, or when it has a single
    /// commit with the same changes (a squash merge). The checked-out branch
    /// and branches in other worktrees are never deleted.
    Tidy(RunArgs),

    /// Fetch and prune every remote
    Update,
}
