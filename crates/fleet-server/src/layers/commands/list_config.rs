use super::ServerContext;
use async_trait::async_trait;
use command_core::{Command, CommandError, CommandOutput};

const NAME: &str = "list-config";

pub(super) fn new_list_config(ctx: ServerContext) -> Box<dyn Command> {
    Box::new(ListConfigCommand { ctx })
}

struct ListConfigCommand {
    ctx: ServerContext,
}

#[async_trait]
impl Command for ListConfigCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn usage(&self) -> String {
        "  Print the configured clusters as a table\n".to_string()
    }

    fn init(&mut self, _opts: &[String]) -> Result<(), CommandError> {
        Ok(())
    }

    async fn run(&mut self) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput::text(self.ctx.entries.config_table()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::commands::testing;
    use crate::shared::entries::{seed, PowerState};

    #[tokio::test]
    async fn renders_every_configured_entry() {
        let ctx = testing::context(vec![
            seed("Demo", "demo", PowerState::Stopped),
            seed("Production East", "prod-east-aks-cluster", PowerState::Running),
        ]);
        let mut command = new_list_config(ctx);
        command.init(&[]).expect("init");
        let output = command.run().await.expect("run");
        assert!(output.text.contains("│ Demo "));
        assert!(output.text.contains("prod-east-aks-cluster"));
        assert_eq!(output.text.lines().count(), 6);
        assert!(output.state_change.is_none());
    }
}
