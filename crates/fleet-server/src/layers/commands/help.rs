use super::{server_registry, ServerContext};
use async_trait::async_trait;
use command_core::{Command, CommandError, CommandOutput};

const NAME: &str = "help";

pub(super) fn new_help(ctx: ServerContext) -> Box<dyn Command> {
    Box::new(HelpCommand { ctx })
}

struct HelpCommand {
    ctx: ServerContext,
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> String {
        "  List server commands and their options\n".to_string()
    }

    fn init(&mut self, _opts: &[String]) -> Result<(), CommandError> {
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        let registry = server_registry()?;
        let mut text = String::new();
        for entry in registry.usages(&self.ctx) {
            text.push_str(entry.name);
            text.push('\n');
            text.push_str(&entry.usage);
            text.push('\n');
        }
        Ok(CommandOutput::text(text))
    }
}
