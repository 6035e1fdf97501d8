use crate::{CommandError, Registry, StateChange, Stopwatch};
use protocol::{Command, CommandResponse};

#[derive(Debug, Clone)]
pub struct Execution {
    pub response: CommandResponse,
    pub state_change: Option<StateChange>,
    pub error: Option<CommandError>,
}

impl Execution {
    fn failure(response: CommandResponse, error: CommandError) -> Self {
        Self {
            response,
            state_change: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Resolves `command` in `registry`, binds it to `resource`, then runs
/// `init` and `run`.
///
/// Every failure is folded into the response. Lookup and run failures carry the
/// time spent so far; an `init` failure is reported with zero duration.
pub async fn execute<R: Send>(
    registry: &Registry<R>,
    resource: R,
    command: &Command,
) -> Execution {
    let stopwatch = Stopwatch::start();

    if command.cmd_name.is_empty() {
        let err = CommandError::NoCommand;
        return Execution::failure(stopwatch.fail(&err), err);
    }

    let mut handler = match registry.resolve(&command.cmd_name, resource) {
        Ok(handler) => handler,
        Err(err) => {
            tracing::debug!(command = %command.cmd_name, "unknown command");
            return Execution::failure(stopwatch.fail(&err), err);
        }
    };

    if let Err(err) = handler.init(&command.cmd_opts) {
        tracing::debug!(command = %command.cmd_name, error = %err, "command init failed");
        return Execution::failure(CommandResponse::rejected(err.to_string()), err);
    }

    match handler.run().await {
        Ok(output) => Execution {
            response: stopwatch.complete(output.text),
            state_change: output.state_change,
            error: None,
        },
        Err(err) => Execution::failure(stopwatch.fail(&err), err),
    }
}
