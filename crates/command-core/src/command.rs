use crate::CommandError;
use async_trait::async_trait;

/// `init` always runs before `run`; an `init` failure means `run` never happens.
#[async_trait]
pub trait Command: Send {
    fn name(&self) -> &'static str;

    fn usage(&self) -> String;

    fn init(&mut self, opts: &[String]) -> Result<(), CommandError>;

    async fn run(&mut self) -> Result<CommandOutput, CommandError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub state_change: Option<StateChange>,
}

impl CommandOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state_change: None,
        }
    }

    pub fn transition(
        text: impl Into<String>,
        cluster: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            state_change: Some(StateChange {
                cluster: cluster.into(),
                status: status.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub cluster: String,
    pub status: String,
}
