use super::ClientContext;
use async_trait::async_trait;
use clap::Parser;
use command_core::options::{parse_options, render_usage};
use command_core::{Command, CommandError, CommandOutput};

const NAME: &str = "update-config";

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct UpdateConfigArgs {
    /// key=value to change; keys are host, port, usetls, cafile and user
    #[arg(long, required = true)]
    set: Vec<String>,
}

pub(super) fn new_update_config(ctx: ClientContext) -> Box<dyn Command> {
    Box::new(UpdateConfigCommand {
        ctx,
        pairs: Vec::new(),
    })
}

struct UpdateConfigCommand {
    ctx: ClientContext,
    pairs: Vec<String>,
}

#[async_trait]
impl Command for UpdateConfigCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> String {
        format!(
            "  Change client settings and save them\n{}",
            render_usage::<UpdateConfigArgs>(NAME)
        )
    }

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError> {
        let args: UpdateConfigArgs = parse_options(NAME, opts)?;
        self.pairs = args.set;
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        let mut current = self.ctx.config.lock().await;
        let mut updated = current.clone();
        for pair in &self.pairs {
            updated
                .update(pair)
                .map_err(|err| CommandError::InvalidOptions {
                    command: NAME.to_string(),
                    message: err.to_string(),
                })?;
        }
        updated
            .save(&self.ctx.path)
            .map_err(|err| CommandError::external(format!("{err:#}")))?;
        tracing::info!(event = "config.updated", path = %self.ctx.path.display());
        *current = updated;
        Ok(CommandOutput::text("Client configuration successfully updated"))
    }
}
