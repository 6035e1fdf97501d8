use crate::layers::audit::{AuditRecord, AuditSender, StateRecord};
use crate::layers::commands::{server_registry, ServerContext};
use command_core::{execute, CommandError, Execution, Registry};
use protocol::rpc::RpcStatus;
use protocol::{Command, CommandResponse, RemoteUsageResult};
use std::time::Duration;

pub(crate) struct Dispatcher {
    registry: Registry<ServerContext>,
    ctx: ServerContext,
    audit: AuditSender,
}

impl Dispatcher {
    pub(crate) fn new(ctx: ServerContext, audit: AuditSender) -> Result<Self, CommandError> {
        Ok(Self {
            registry: server_registry()?,
            ctx,
            audit,
        })
    }

    /// Command failures come back inside the response. Only a missing actor
    /// or an expired deadline surface as [`RpcStatus`], and neither is audited.
    pub(crate) async fn dispatch_with_deadline(
        &self,
        command: &Command,
        deadline: Duration,
    ) -> Result<CommandResponse, RpcStatus> {
        if command.user_id.is_empty() {
            tracing::warn!(
                event = "command.rejected",
                command = %command.cmd_name,
                reason = "missing actor",
            );
            return Err(RpcStatus::invalid_argument(
                CommandError::MissingActor.to_string(),
            ));
        }

        tracing::info!(
            event = "command.received",
            user = %command.user_id,
            command = %command.cmd_name,
            options = %command.joined_opts(),
        );
        let run = execute(&self.registry, self.ctx.clone(), command);
        let execution = match tokio::time::timeout(deadline, run).await {
            Ok(execution) => execution,
            Err(_) => {
                tracing::warn!(
                    event = "command.deadline_exceeded",
                    user = %command.user_id,
                    command = %command.cmd_name,
                    deadline = %humantime::format_duration(deadline),
                );
                return Err(RpcStatus::deadline_exceeded(format!(
                    "command {} did not finish within {}",
                    command.cmd_name,
                    humantime::format_duration(deadline)
                )));
            }
        };

        match &execution.error {
            None => tracing::info!(
                event = "command.completed",
                user = %command.user_id,
                command = %command.cmd_name,
                exec_time = ?execution.response.exec_time,
            ),
            Some(err) => tracing::info!(
                event = "command.failed",
                user = %command.user_id,
                command = %command.cmd_name,
                kind = ?err.kind(),
                error = %err,
            ),
        }
        self.record(command, &execution).await;
        Ok(execution.response)
    }

    pub(crate) fn remote_usage(&self) -> RemoteUsageResult {
        let usages = self.registry.usages(&self.ctx);
        RemoteUsageResult::from_pairs(usages.iter().map(|entry| (entry.name, entry.usage.as_str())))
    }

    async fn record(&self, command: &Command, execution: &Execution) {
        self.audit
            .send(AuditRecord::new(command, &execution.response))
            .await;
        // Only a successful start/stop carries a state change.
        if let Some(change) = &execution.state_change {
            self.audit
                .send(StateRecord::new(
                    &command.user_id,
                    &change.cluster,
                    &change.status,
                ))
                .await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::layers::audit::{audit_channel, RecMessage};
    use tokio::sync::mpsc;

    pub(crate) fn dispatcher(ctx: ServerContext) -> (Dispatcher, mpsc::Receiver<RecMessage>) {
        let (audit, rx) = audit_channel(20);
        let dispatcher = Dispatcher::new(ctx, audit).expect("dispatcher");
        (dispatcher, rx)
    }

    pub(crate) fn drain(rx: &mut mpsc::Receiver<RecMessage>) -> Vec<RecMessage> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }
}
