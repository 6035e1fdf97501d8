use super::{client_registry, ClientContext, HELP};
use async_trait::async_trait;
use clap::Parser;
use command_core::options::{parse_options, render_usage};
use command_core::{Command, CommandError, CommandOutput};

#[derive(Parser, Debug)]
#[command(disable_help_flag = true)]
struct HelpArgs {
    /// Also list the commands the server accepts
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    remote: bool,
}

pub(super) fn new_help(ctx: ClientContext) -> Box<dyn Command> {
    Box::new(HelpCommand { ctx })
}

/// Local half of help. The remote listing is appended by the dispatcher.
struct HelpCommand {
    ctx: ClientContext,
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        HELP
    }

    fn usage(&self) -> String {
        format!(
            "  List client commands and their options\n{}",
            render_usage::<HelpArgs>(HELP)
        )
    }

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError> {
        parse_options::<HelpArgs>(HELP, opts)?;
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        let registry = client_registry()?;
        let mut text = String::from("Usage for fleetctl\nCOMMANDS:\n");
        for entry in registry.usages(&self.ctx) {
            text.push('\n');
            text.push_str(entry.name);
            text.push('\n');
            text.push_str(&entry.usage);
        }
        Ok(CommandOutput::text(text))
    }
}
