use protocol::rpc::RpcStatus;
use std::fmt::Display;

/// Failures a command execution can end in. The `Display` text is what callers
/// see in `cmd_error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("no valid user set. aborting command execution")]
    MissingActor,

    #[error("no sub-command provided")]
    NoCommand,

    #[error("unknown sub-command: {0}")]
    UnknownCommand(String),

    #[error("command {0} is already registered")]
    DuplicateCommand(String),

    #[error("invalid options for {command}: {message}")]
    InvalidOptions { command: String, message: String },

    #[error("cluster {0} is not configured")]
    ClusterNotFound(String),

    #[error("{0}")]
    StateConflict(String),

    #[error("{0}")]
    External(String),

    #[error(transparent)]
    Transport(#[from] RpcStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ExternalService,
    StateConflict,
    Transport,
}

impl CommandError {
    pub fn external(err: impl Display) -> Self {
        Self::External(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingActor
            | Self::NoCommand
            | Self::UnknownCommand(_)
            | Self::DuplicateCommand(_)
            | Self::InvalidOptions { .. }
            | Self::ClusterNotFound(_) => ErrorKind::Validation,
            Self::StateConflict(_) => ErrorKind::StateConflict,
            Self::External(_) => ErrorKind::ExternalService,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }
}
