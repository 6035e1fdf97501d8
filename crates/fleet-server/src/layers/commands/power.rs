use super::ServerContext;
use crate::layers::control::poll_until_done;
use crate::shared::entries::PowerState;
use async_trait::async_trait;
use clap::Parser;
use command_core::options::{parse_options, render_usage};
use command_core::{Command, CommandError, CommandOutput};

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct PowerArgs {
    /// Cluster name as configured
    #[arg(long)]
    cluster: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Start,
    Stop,
}

impl Direction {
    fn command_name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    fn target(self) -> PowerState {
        match self {
            Self::Start => PowerState::Running,
            Self::Stop => PowerState::Stopped,
        }
    }

    fn conflict(self, cluster: &str) -> CommandError {
        let state = match self {
            Self::Start => "running",
            Self::Stop => "stopped",
        };
        CommandError::StateConflict(format!("cluster {cluster} is already {state}"))
    }

    fn done(self, cluster: &str) -> String {
        match self {
            Self::Start => format!("Started {cluster} successfully"),
            Self::Stop => format!("Stopped {cluster} successfully"),
        }
    }
}

pub(super) fn new_start(ctx: ServerContext) -> Box<dyn Command> {
    Box::new(PowerCommand::new(ctx, Direction::Start))
}

pub(super) fn new_stop(ctx: ServerContext) -> Box<dyn Command> {
    Box::new(PowerCommand::new(ctx, Direction::Stop))
}

struct PowerCommand {
    ctx: ServerContext,
    direction: Direction,
    cluster: String,
}

impl PowerCommand {
    fn new(ctx: ServerContext, direction: Direction) -> Self {
        Self {
            ctx,
            direction,
            cluster: String::new(),
        }
    }
}

#[async_trait]
impl Command for PowerCommand {
    fn name(&self) -> &'static str {
        self.direction.command_name()
    }

    fn usage(&self) -> String {
        let summary = match self.direction {
            Direction::Start => "  Start a stopped cluster and wait until it is running",
            Direction::Stop => "  Stop a running cluster and wait until it is stopped",
        };
        format!("{summary}\n{}", render_usage::<PowerArgs>(self.name()))
    }

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError> {
        let args: PowerArgs = parse_options(self.name(), opts)?;
        self.cluster = args.cluster;
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        let entry = self
            .ctx
            .entries
            .find(&self.cluster)
            .ok_or_else(|| CommandError::ClusterNotFound(self.cluster.clone()))?;
        let target = self.direction.target();

        // Held until the new state is assigned; a concurrent refresh or a
        // duplicate request for this cluster waits here.
        let mut state = entry.lock().await;
        if *state == target {
            return Err(self.direction.conflict(&self.cluster));
        }

        tracing::info!(
            event = "cluster.transition.begin",
            cluster = %self.cluster,
            resource_group = %entry.resource_group(),
            desired = %target,
        );
        let control = &self.ctx.control;
        let operation = match self.direction {
            Direction::Start => {
                control
                    .begin_start(entry.resource_group(), entry.cluster_name())
                    .await
            }
            Direction::Stop => {
                control
                    .begin_stop(entry.resource_group(), entry.cluster_name())
                    .await
            }
        }
        .map_err(CommandError::external)?;
        poll_until_done(operation, self.ctx.poll_interval)
            .await
            .map_err(CommandError::external)?;

        *state = target;
        tracing::info!(
            event = "cluster.transition.done",
            cluster = %self.cluster,
            state = %target,
        );
        Ok(CommandOutput::transition(
            self.direction.done(&self.cluster),
            self.cluster.clone(),
            target.label(),
        ))
    }
}
