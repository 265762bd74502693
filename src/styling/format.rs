//! Text helpers for user-facing messages: gutters, branch lists, counts,
//! and copy-pasteable command suggestions.

use std::borrow::Cow;

use color_print::cformat;
use shell_escape::escape;

use super::{GUTTER, get_terminal_width};

/// Format multi-line content with a gutter (quoted block).
///
/// Used for git's own output inside error messages. The gutter sits at
/// column 0 followed by one space, so content lines up with message text
/// after a symbol.
pub fn format_with_gutter(content: &str, max_width: Option<usize>) -> String {
    let term_width = max_width.unwrap_or_else(get_terminal_width);
    // gutter (1) + space (1)
    let available_width = term_width.saturating_sub(2);

    content
        .lines()
        .flat_map(|line| wrap_line(line, available_width))
        .map(|line| format!("{GUTTER} {GUTTER:#} {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if width < 10 || line.chars().count() <= width {
        return vec![line.to_string()];
    }
    let options = wrap_ansi::WrapOptions::builder()
        .trim_whitespace(false)
        .build();
    wrap_ansi::wrap_ansi(line, width, Some(options))
        .lines()
        .map(str::to_string)
        .collect()
}

/// Style a branch name for inline use in a message.
pub fn format_branch(branch: &str) -> String {
    cformat!("<bold>{branch}</>")
}

/// Join branch names in English: `a`, `a and b`, `a, b, and c`.
///
/// Names are styled with [`format_branch`] and kept in the given order.
pub fn format_branches<S: AsRef<str>>(branches: &[S]) -> String {
    let styled: Vec<String> = branches
        .iter()
        .map(|b| format_branch(b.as_ref()))
        .collect();
    match styled.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

/// `1 branch`, `2 branches`.
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Build a suggested command string for hints.
///
/// Returns a copy-pasteable command like `tidybranch config default-branch main`.
/// Arguments are shell-escaped, and a `--` separator goes before the first
/// argument starting with `-`.
pub fn suggest_command(subcommand: &str, args: &[&str], flags: &[&str]) -> String {
    let mut parts = vec!["tidybranch".to_string(), subcommand.to_string()];
    let mut separator_inserted = false;

    for arg in args {
        if arg.starts_with('-') && !separator_inserted {
            parts.push("--".to_string());
            separator_inserted = true;
        }
        parts.push(escape(Cow::Borrowed(*arg)).into_owned());
    }

    parts.extend(flags.iter().map(|s| s.to_string()));
    parts.join(" ")
}
