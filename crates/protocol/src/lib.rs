use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

pub mod framing;
pub mod rpc;

/// Name carried by commands the server synthesizes for itself.
pub const SYSTEM_ACTOR: &str = "status-watcher";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub user_id: String,
    pub cmd_name: String,
    #[serde(default)]
    pub cmd_opts: Vec<String>,
}

impl Command {
    pub fn new(
        user_id: impl Into<String>,
        cmd_name: impl Into<String>,
        cmd_opts: Vec<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            cmd_name: cmd_name.into(),
            cmd_opts,
        }
    }

    pub fn joined_opts(&self) -> String {
        self.cmd_opts.join(" ")
    }

    /// True when a boolean `flag` is set: `-flag`, `--flag` or `-flag=true`.
    /// Any other value (`-flag=false`, `-flag=yes`) leaves it unset.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.cmd_opts.iter().any(|token| {
            let Some(name) = token.strip_prefix("--").or_else(|| token.strip_prefix('-')) else {
                return false;
            };
            match name.split_once('=') {
                Some((name, value)) => name == flag && value.parse().unwrap_or(false),
                None => name == flag,
            }
        })
    }
}

/// At most one of `cmd_result` / `cmd_error` carries text. `end_time` is always
/// `start_time + exec_time`; the constructors are the only way the crates in this
/// workspace build one, which keeps that invariant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    #[serde(default)]
    pub cmd_result: String,
    #[serde(default)]
    pub cmd_error: String,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub exec_time: Duration,
}

impl CommandResponse {
    pub fn completed(
        result: impl Into<String>,
        start_time: SystemTime,
        exec_time: Duration,
    ) -> Self {
        Self {
            cmd_result: result.into(),
            cmd_error: String::new(),
            start_time,
            end_time: start_time + exec_time,
            exec_time,
        }
    }

    pub fn failed(error: impl Into<String>, start_time: SystemTime, exec_time: Duration) -> Self {
        Self {
            cmd_result: String::new(),
            cmd_error: error.into(),
            start_time,
            end_time: start_time + exec_time,
            exec_time,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self::failed(error, SystemTime::now(), Duration::ZERO)
    }

    pub fn is_error(&self) -> bool {
        !self.cmd_error.is_empty()
    }

    pub fn append_result(&mut self, text: &str) {
        self.cmd_result.push_str(text);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteUsageResult {
    #[serde(default)]
    pub remote_command_usage: Vec<String>,
}

impl RemoteUsageResult {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut remote_command_usage = Vec::new();
        for (name, usage) in pairs {
            remote_command_usage.push(format!("{name}\n"));
            remote_command_usage.push(usage.to_string());
        }
        Self {
            remote_command_usage,
        }
    }

    pub fn render(&self) -> String {
        self.remote_command_usage.concat()
    }
}
