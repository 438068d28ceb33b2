//! Unified diffs for `--check`.

use std::env;
use std::fmt::Write;
use std::io::IsTerminal;

use clap::ValueEnum;
use similar::{ChangeTag, TextDiff};

/// Lines of context around each change.
const CONTEXT_LINES: usize = 3;

/// When `--check` colors its diff.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    /// Always emit ANSI escapes
    Always,
    /// Plain text, suitable for CI logs and patch files
    Never,
}

impl ColorChoice {
    /// Resolve against the environment.
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        }
    }
}

/// Unified diff from `current` to `generated`, or `None` if they match.
///
/// Plain output is a standard unified diff with `@@` hunk headers; `color`
/// adds ANSI escapes for terminals.
pub fn unified_diff(name: &str, current: &str, generated: &str, color: bool) -> Option<String> {
    if current == generated {
        return None;
    }

    let diff = TextDiff::from_lines(current, generated);
    let current_label = format!("{name} (current)");
    let generated_label = format!("{name} (generated)");
    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_LINES)
        .header(&current_label, &generated_label);

    if !color {
        return Some(unified.to_string());
    }

    let mut output = String::new();
    let _ = writeln!(output, "\x1b[1m--- {current_label}\x1b[0m");
    let _ = writeln!(output, "\x1b[1m+++ {generated_label}\x1b[0m");

    for hunk in unified.iter_hunks() {
        let _ = writeln!(output, "\x1b[36m{}\x1b[0m", hunk.header());
        for change in hunk.iter_changes() {
            let (sign, style) = match change.tag() {
                ChangeTag::Delete => ("-", "\x1b[31m"),
                ChangeTag::Insert => ("+", "\x1b[32m"),
                ChangeTag::Equal => (" ", ""),
            };
            output.push_str(style);
            output.push_str(sign);
            output.push_str(change.value());
            if change.missing_newline() {
                output.push('\n');
            }
            if !style.is_empty() {
                output.push_str("\x1b[0m");
            }
        }
    }

    Some(output)
}
