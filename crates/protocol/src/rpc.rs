use crate::{Command, CommandResponse, RemoteUsageResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:19420";

pub const UNARY_DEADLINE: Duration = Duration::from_secs(5 * 60);
/// Deadline for a `command_listener` stream; start/stop poll the control API
/// until done, so this one is longer.
pub const STREAM_DEADLINE: Duration = Duration::from_secs(6 * 60);

/// First frame on every connection. For `CommandListener` the client then sends
/// bare [`Command`] frames and half-closes its side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RpcRequest {
    ExecCommand { command: Command },
    CommandListener,
    GetRemoteCommands,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RpcReply {
    Response { response: CommandResponse },
    RemoteUsage { result: RemoteUsageResult },
    Status { status: RpcStatus },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    InvalidArgument,
    DeadlineExceeded,
    Unavailable,
    Internal,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RpcStatus {
    pub code: StatusCode,
    pub message: String,
}

impl RpcStatus {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(StatusCode::DeadlineExceeded, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }
}
