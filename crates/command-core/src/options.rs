//! Option-token parsing for commands.
//!
//! Tokens arrive as a flat list (`["-cluster", "demo"]`). Single-dash long
//! flags are accepted alongside the `--flag` form, then handed to a clap
//! derive struct.

use crate::CommandError;
use clap::{CommandFactory, Parser};

pub fn parse_options<T: Parser>(
    command: &'static str,
    tokens: &[String],
) -> Result<T, CommandError> {
    let argv = std::iter::once(command.to_string())
        .chain(tokens.iter().map(|token| normalize_flag(token)));
    T::try_parse_from(argv).map_err(|err| CommandError::InvalidOptions {
        command: command.to_string(),
        message: summarize(&err.render().to_string()),
    })
}

pub fn render_usage<T: CommandFactory>(command: &'static str) -> String {
    let mut cmd = T::command().name(command);
    let rendered = cmd.render_help().to_string();
    let mut usage = String::new();
    for line in rendered.lines() {
        if line.trim().is_empty() || line.starts_with("Usage:") || line.starts_with("Options:") {
            continue;
        }
        usage.push_str(line);
        usage.push('\n');
    }
    usage
}

fn normalize_flag(token: &str) -> String {
    if token.len() > 2 && token.starts_with('-') && !token.starts_with("--") {
        format!("-{token}")
    } else {
        token.to_string()
    }
}

fn summarize(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .take_while(|line| !line.starts_with("Usage:"))
        .filter(|line| !line.is_empty() && !line.starts_with("tip:"))
        .map(|line| line.trim_start_matches("error: "))
        .collect::<Vec<_>>()
        .join(" ")
}
