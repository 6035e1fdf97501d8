mod help;
mod list_config;
mod power;
mod status;

use crate::layers::control::ClusterControl;
use crate::shared::entries::EntryList;
use command_core::{CommandError, Constructor, Registry};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub(crate) struct ServerContext {
    pub(crate) entries: Arc<EntryList>,
    pub(crate) control: Arc<dyn ClusterControl>,
    pub(crate) poll_interval: Duration,
}

const SERVER_COMMANDS: &[(&str, Constructor<ServerContext>)] = &[
    ("status", status::new_status),
    ("list-config", list_config::new_list_config),
    ("start", power::new_start),
    ("stop", power::new_stop),
    ("help", help::new_help),
];

pub(crate) fn server_registry() -> Result<Registry<ServerContext>, CommandError> {
    let mut registry = Registry::new();
    for &(name, constructor) in SERVER_COMMANDS {
        registry.register(name, constructor)?;
    }
    Ok(registry)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::layers::control::SimulatedControl;
    use crate::shared::entries::ClusterEntry;

    /// Context over a simulated control plane whose transitions finish
    /// immediately and whose state mirrors the seeds.
    pub(crate) fn context(seeds: Vec<ClusterEntry>) -> ServerContext {
        let control = SimulatedControl::new(
            Duration::ZERO,
            seeds.iter().map(|seed| {
                (
                    seed.resource_group.clone(),
                    seed.cluster_name.clone(),
                    seed.power_state,
                )
            }),
        );
        with_control(seeds, Arc::new(control))
    }

    pub(crate) fn with_control(
        seeds: Vec<ClusterEntry>,
        control: Arc<dyn ClusterControl>,
    ) -> ServerContext {
        ServerContext {
            entries: Arc::new(EntryList::new(seeds)),
            control,
            poll_interval: Duration::from_millis(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_server_command_constructs_under_its_own_name() {
        let registry = server_registry().expect("registry");
        let ctx = testing::context(Vec::new());
        for name in registry.names().collect::<Vec<_>>() {
            let command = registry.resolve(name, ctx.clone()).expect("resolve");
            assert_eq!(command.name(), name);
        }
        assert_eq!(registry.names().count(), SERVER_COMMANDS.len());
    }
}
