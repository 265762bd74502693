use std::io::Write;
use std::process;

use clap::Parser;
use tidybranch::config::ConfigKey;
use tidybranch::git::{GitError, set_base_path};
use tidybranch::styling::error_message;
use tidybranch::tidy::Command;

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands, ConfigCommand};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        print_error(&e);
        process::exit(1);
    }
}

/// `-v` raises the default filter one level per flag; `RUST_LOG` wins.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "warn",
        2 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            let line = record.args().to_string();
            if line.starts_with("$ ") || line.starts_with("[tb-trace]") {
                writeln!(buf, "{line}")
            } else {
                writeln!(buf, "[{}] {line}", record.level().as_str().to_lowercase())
            }
        })
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(directory) = cli.directory {
        let path = dunce::canonicalize(&directory)
            .map_err(|_| GitError::NotARepository { path: directory })?;
        set_base_path(path);
    }

    let Some(command) = cli.command else {
        // arg_required_else_help already handled the no-argument case
        return Ok(());
    };

    match command {
        Commands::Config { action } => match action {
            None => commands::handle_config_show(),
            Some(ConfigCommand::Init) => commands::handle_config_init(),
            Some(ConfigCommand::DefaultBranch { name }) => {
                commands::handle_config_set(ConfigKey::DefaultBranch, &name)
            }
            Some(ConfigCommand::DefaultRemote { name }) => {
                commands::handle_config_set(ConfigKey::DefaultRemote, &name)
            }
        },
        Commands::Finish(args) => {
            commands::handle_run(Command::Finish, args.options(), args.format)
        }
        Commands::Tidy(args) => commands::handle_run(Command::Tidy, args.options(), args.format),
        Commands::Update => commands::handle_update(),
    }
}

/// `GitError`s carry their own styling; anything else gets the error symbol.
/// Context added around a `GitError` (the step a run stopped in) goes on its
/// own line above it.
fn print_error(error: &anyhow::Error) {
    let message = match error.root_cause().downcast_ref::<GitError>() {
        Some(git_error) => {
            let context: Vec<String> = error
                .chain()
                .take_while(|cause| cause.downcast_ref::<GitError>().is_none())
                .map(ToString::to_string)
                .collect();
            if context.is_empty() {
                git_error.to_string()
            } else {
                format!("{}\n{git_error}", error_message(context.join(": ")))
            }
        }
        None => error_message(format!("{error:#}")).into(),
    };
    // Nothing left to report to if stderr is gone
    let _ = output::print(message);
}
