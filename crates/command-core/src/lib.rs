//! Command model shared by the `fleetd` server and the `fleetctl` client.
//!
//! A command name resolves through a [`Registry`] to a constructor with a fixed
//! signature (`fn(resource) -> Box<dyn Command>`); [`execute`] runs the
//! lookup, construction, `init` and `run` steps and times them into a
//! [`protocol::CommandResponse`].

mod command;
mod error;
mod execute;
pub mod options;
mod registry;
mod stopwatch;

pub use command::{Command, CommandOutput, StateChange};
pub use error::{CommandError, ErrorKind};
pub use execute::{execute, Execution};
pub use registry::{Constructor, Registry, UsageEntry, ValidCommand};
pub use stopwatch::Stopwatch;
