use super::ServerContext;
use async_trait::async_trait;
use clap::Parser;
use command_core::options::{parse_options, render_usage};
use command_core::{Command, CommandError, CommandOutput};

const NAME: &str = "status";
const ALL: &str = "ALL";

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct StatusArgs {
    /// Cluster name to query, or ALL for every configured cluster
    #[arg(long, default_value = ALL)]
    cluster: String,
}

pub(super) fn new_status(ctx: ServerContext) -> Box<dyn Command> {
    Box::new(StatusCommand {
        ctx,
        cluster: ALL.to_string(),
    })
}

struct StatusCommand {
    ctx: ServerContext,
    cluster: String,
}

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> String {
        format!(
            "  Refresh power state from the control plane and report it as JSON\n{}",
            render_usage::<StatusArgs>(NAME)
        )
    }

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError> {
        let args: StatusArgs = parse_options(NAME, opts)?;
        self.cluster = args.cluster;
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        let mut statuses = Vec::new();
        for entry in self.ctx.entries.addressable() {
            if self.cluster != ALL && self.cluster != entry.cluster_name() {
                continue;
            }
            let mut state = entry.lock().await;
            let current = self
                .ctx
                .control
                .get(entry.resource_group(), entry.cluster_name())
                .await
                .map_err(CommandError::external)?;
            *state = current;
            statuses.push(entry.view(current));
        }
        let text = serde_json::to_string(&statuses).map_err(CommandError::external)?;
        Ok(CommandOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::commands::testing;
    use crate::layers::control::SimulatedControl;
    use crate::shared::entries::{seed, ClusterEntry, PowerState};
    use std::sync::Arc;
    use std::time::Duration;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn refreshes_cached_state_from_control_plane() {
        let seeds = vec![
            seed("Demo", "demo", PowerState::Unknown),
            seed("Prod", "prod", PowerState::Unknown),
        ];
        let control = SimulatedControl::new(
            Duration::ZERO,
            [
                ("rg-Demo".to_string(), "demo".to_string(), PowerState::Running),
                ("rg-Prod".to_string(), "prod".to_string(), PowerState::Stopped),
            ],
        );
        let ctx = testing::with_control(seeds, Arc::new(control));
        let mut command = new_status(ctx.clone());
        command.init(&[]).expect("init");
        let output = command.run().await.expect("run");

        let reported: Vec<ClusterEntry> = serde_json::from_str(&output.text).expect("json");
        assert_eq!(reported.len(), 2);
        assert_eq!(reported[0].power_state, PowerState::Running);
        assert_eq!(reported[1].power_state, PowerState::Stopped);
        assert!(output.state_change.is_none());

        let cached = ctx.entries.snapshot().await;
        assert_eq!(cached[0].power_state, PowerState::Running);
        assert_eq!(cached[1].power_state, PowerState::Stopped);
    }

    #[tokio::test]
    async fn filters_by_cluster_and_skips_unaddressable() {
        let mut orphan = seed("Orphan", "orphan", PowerState::Stopped);
        orphan.cluster_name.clear();
        let ctx = testing::context(vec![
            orphan,
            seed("Demo", "demo", PowerState::Stopped),
            seed("Prod", "prod", PowerState::Running),
        ]);

        let mut command = new_status(ctx.clone());
        command.init(&opts(&["-cluster", "prod"])).expect("init");
        let output = command.run().await.expect("run");
        assert_eq!(
            output.text,
            r#"[{"name":"Prod","resourceGroup":"rg-Prod","clusterName":"prod","powerState":"Running"}]"#
        );

        let mut command = new_status(ctx);
        command.init(&[]).expect("init");
        let output = command.run().await.expect("run");
        let reported: Vec<ClusterEntry> = serde_json::from_str(&output.text).expect("json");
        assert_eq!(reported.len(), 2);
    }

    #[tokio::test]
    async fn control_plane_failure_is_external() {
        let control = SimulatedControl::new(Duration::ZERO, Vec::new());
        let ctx = testing::with_control(
            vec![seed("Demo", "demo", PowerState::Stopped)],
            Arc::new(control),
        );
        let mut command = new_status(ctx);
        command.init(&[]).expect("init");
        let err = command.run().await.unwrap_err();
        assert_eq!(err.kind(), command_core::ErrorKind::ExternalService);
    }
}
