//! Process execution with tracing.
//!
//! Every external command tidybranch spawns (in practice, only `git`) goes
//! through [`run`] so that `-vvv` shows exactly what ran, where, and how long
//! it took.

use std::process::{Command, Output};
use std::time::Instant;

/// Execute a command with timing and debug logging.
///
/// This is the **only** way to run external commands in tidybranch.
///
/// ```text
/// $ git merge-base main feature [repo]    # with context
/// [tb-trace] context=repo cmd="..." dur=4.1ms ok=true
/// ```
///
/// The `context` parameter is typically the repository directory name.
pub fn run(cmd: &mut Command, context: Option<&str>) -> std::io::Result<Output> {
    let cmd_str = describe(cmd);

    match context {
        Some(ctx) => log::debug!("$ {} [{}]", cmd_str, ctx),
        None => log::debug!("$ {}", cmd_str),
    }

    let t0 = Instant::now();
    let result = cmd.output();
    let duration_ms = t0.elapsed().as_secs_f64() * 1000.0;

    let ctx = context.map(|c| format!("context={c} ")).unwrap_or_default();
    match &result {
        Ok(output) => log::debug!(
            "[tb-trace] {}cmd=\"{}\" dur={:.1}ms ok={}",
            ctx,
            cmd_str,
            duration_ms,
            output.status.success()
        ),
        Err(e) => log::debug!(
            "[tb-trace] {}cmd=\"{}\" dur={:.1}ms err=\"{}\"",
            ctx,
            cmd_str,
            duration_ms,
            e
        ),
    }

    result
}

/// Render a command as `program arg1 arg2` for logs and error messages.
pub fn describe(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
