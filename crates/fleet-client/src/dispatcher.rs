use crate::commands::{client_registry, ClientContext, HELP};
use crate::transport::Transport;
use command_core::{execute, CommandError, Registry};
use protocol::{Command, CommandResponse};
use std::sync::Arc;

/// Routes each command to the local registry or to the server.
///
/// The transport is only touched for remote commands and `help -remote`, so
/// purely local invocations never open a connection.
pub(crate) struct ClientDispatcher {
    registry: Registry<ClientContext>,
    ctx: ClientContext,
    transport: Arc<dyn Transport>,
    unary: bool,
}

impl ClientDispatcher {
    pub(crate) fn new(
        ctx: ClientContext,
        transport: Arc<dyn Transport>,
        unary: bool,
    ) -> Result<Self, CommandError> {
        Ok(Self {
            registry: client_registry()?,
            ctx,
            transport,
            unary,
        })
    }

    pub(crate) async fn dispatch(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        if command.cmd_name.is_empty() {
            return Err(CommandError::NoCommand);
        }
        if command.cmd_name == HELP && command.has_flag("remote") {
            return self.hybrid_help(command).await;
        }
        if self.registry.contains(&command.cmd_name) {
            tracing::debug!(event = "command.local", command = %command.cmd_name);
            let execution = execute(&self.registry, self.ctx.clone(), command).await;
            return Ok(execution.response);
        }

        tracing::debug!(
            event = "command.remote",
            command = %command.cmd_name,
            unary = self.unary,
        );
        let response = if self.unary {
            self.transport.exec_command(command).await?
        } else {
            self.transport.command_listener(command).await?
        };
        Ok(response)
    }

    async fn hybrid_help(&self, command: &Command) -> Result<CommandResponse, CommandError> {
        let mut response = execute(&self.registry, self.ctx.clone(), command)
            .await
            .response;
        if response.is_error() {
            return Ok(response);
        }
        let remote = self.transport.remote_commands().await?;
        response.append_result("\nREMOTE COMMANDS:\n");
        response.append_result(&remote.render());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use async_trait::async_trait;
    use protocol::rpc::RpcStatus;
    use protocol::RemoteUsageResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<&'static str>>,
        down: bool,
    }

    impl Recording {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("calls").clone()
        }

        fn answer(&self, call: &'static str, text: &str) -> Result<CommandResponse, RpcStatus> {
            self.calls.lock().expect("calls").push(call);
            if self.down {
                return Err(RpcStatus::unavailable("connection refused"));
            }
            Ok(CommandResponse::completed(
                text,
                std::time::SystemTime::now(),
                std::time::Duration::ZERO,
            ))
        }
    }

    #[async_trait]
    impl Transport for Recording {
        async fn exec_command(&self, command: &Command) -> Result<CommandResponse, RpcStatus> {
            self.answer("exec_command", &command.cmd_name)
        }

        async fn command_listener(&self, command: &Command) -> Result<CommandResponse, RpcStatus> {
            self.answer("command_listener", &command.cmd_name)
        }

        async fn remote_commands(&self) -> Result<RemoteUsageResult, RpcStatus> {
            self.answer("remote_commands", "")?;
            Ok(RemoteUsageResult::from_pairs([("status", "  --cluster <CLUSTER>\n")]))
        }
    }

    fn dispatcher(
        dir: &tempfile::TempDir,
        transport: Arc<Recording>,
        unary: bool,
    ) -> ClientDispatcher {
        ClientDispatcher::new(testing::context(dir), transport, unary).expect("dispatcher")
    }

    fn command(name: &str, opts: &[&str]) -> Command {
        Command::new("alice", name, opts.iter().map(|opt| opt.to_string()).collect())
    }

    #[tokio::test]
    async fn local_commands_never_touch_the_transport() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording::default());
        let dispatcher = dispatcher(&dir, transport.clone(), false);

        let response = dispatcher
            .dispatch(&command("show-config", &[]))
            .await
            .expect("dispatch");
        assert!(response.cmd_result.contains("--- Client Config ---"));
        let response = dispatcher.dispatch(&command("help", &[])).await.expect("dispatch");
        assert!(!response.cmd_result.contains("REMOTE COMMANDS"));
        let response = dispatcher
            .dispatch(&command("update-config", &[]))
            .await
            .expect("dispatch");
        assert!(response.is_error());

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_commands_use_the_listener_unless_unary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording::default());
        let response = dispatcher(&dir, transport.clone(), false)
            .dispatch(&command("status", &["-cluster", "demo"]))
            .await
            .expect("dispatch");
        assert_eq!(response.cmd_result, "status");

        dispatcher(&dir, transport.clone(), true)
            .dispatch(&command("list-config", &[]))
            .await
            .expect("dispatch");
        assert_eq!(transport.calls(), vec!["command_listener", "exec_command"]);
    }

    #[tokio::test]
    async fn remote_help_appends_server_usage() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording::default());
        let response = dispatcher(&dir, transport.clone(), false)
            .dispatch(&command("help", &["-remote"]))
            .await
            .expect("dispatch");

        let (local, remote) = response
            .cmd_result
            .split_once("\nREMOTE COMMANDS:\n")
            .expect("remote section");
        assert!(local.contains("show-config"));
        assert_eq!(remote, "status\n  --cluster <CLUSTER>\n");
        assert_eq!(transport.calls(), vec!["remote_commands"]);
    }

    #[tokio::test]
    async fn help_with_remote_false_stays_local() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording::default());
        let response = dispatcher(&dir, transport.clone(), false)
            .dispatch(&command("help", &["-remote=false"]))
            .await
            .expect("dispatch");

        assert!(!response.is_error(), "{}", response.cmd_result);
        assert!(response.cmd_result.starts_with("Usage for fleetctl\nCOMMANDS:\n"));
        assert!(!response.cmd_result.contains("REMOTE COMMANDS"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_faults_are_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording {
            down: true,
            ..Recording::default()
        });
        let dispatcher = dispatcher(&dir, transport, false);

        let err = dispatcher
            .dispatch(&command("start", &["-cluster", "demo"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
        let err = dispatcher
            .dispatch(&command("help", &["-remote"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Transport(_)));
    }

    #[tokio::test]
    async fn empty_name_is_rejected_locally() {
        let dir = tempfile::tempdir().expect("tempdir");
        let transport = Arc::new(Recording::default());
        let err = dispatcher(&dir, transport.clone(), false)
            .dispatch(&command("", &[]))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::NoCommand);
        assert!(transport.calls().is_empty());
    }
}
