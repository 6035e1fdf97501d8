use super::ClientContext;
use async_trait::async_trait;
use clap::Parser;
use command_core::options::{parse_options, render_usage};
use command_core::{Command, CommandError, CommandOutput};

const NAME: &str = "show-config";

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct ShowConfigArgs {
    /// Print the config file as stored on disk
    #[arg(long)]
    raw: bool,
}

pub(super) fn new_show_config(ctx: ClientContext) -> Box<dyn Command> {
    Box::new(ShowConfigCommand { ctx, raw: false })
}

struct ShowConfigCommand {
    ctx: ClientContext,
    raw: bool,
}

#[async_trait]
impl Command for ShowConfigCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> String {
        format!(
            "  Print the client configuration\n{}",
            render_usage::<ShowConfigArgs>(NAME)
        )
    }

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError> {
        let args: ShowConfigArgs = parse_options(NAME, opts)?;
        self.raw = args.raw;
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        if self.raw {
            let raw = tokio::fs::read_to_string(&self.ctx.path)
                .await
                .map_err(CommandError::external)?;
            return Ok(CommandOutput::text(raw));
        }
        Ok(CommandOutput::text(self.ctx.config.lock().await.show()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[tokio::test]
    async fn summary_and_raw_views() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = testing::context(&dir);

        let mut command = new_show_config(ctx.clone());
        command.init(&[]).expect("init");
        let summary = command.run().await.expect("run").text;
        assert!(summary.contains("Host Name: 127.0.0.1"));

        let mut command = new_show_config(ctx);
        command.init(&["-raw".to_string()]).expect("init");
        let raw = command.run().await.expect("run").text;
        assert!(raw.contains("host = \"127.0.0.1\""), "{raw}");
        assert!(raw.contains("[tls]"), "{raw}");
    }
}
