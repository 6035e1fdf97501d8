//! Commands `fleetctl` runs without touching the network.

mod help;
mod show_config;
mod update_config;

use crate::config::ClientConfig;
use command_core::{CommandError, Constructor, Registry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) struct ClientContext {
    pub(crate) config: Arc<Mutex<ClientConfig>>,
    pub(crate) path: PathBuf,
}

impl ClientContext {
    pub(crate) fn new(config: ClientConfig, path: PathBuf) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            path,
        }
    }
}

pub(crate) const HELP: &str = "help";

const LOCAL_COMMANDS: &[(&str, Constructor<ClientContext>)] = &[
    ("show-config", show_config::new_show_config),
    ("update-config", update_config::new_update_config),
    (HELP, help::new_help),
];

pub(crate) fn client_registry() -> Result<Registry<ClientContext>, CommandError> {
    let mut registry = Registry::new();
    for &(name, constructor) in LOCAL_COMMANDS {
        registry.register(name, constructor)?;
    }
    Ok(registry)
}
