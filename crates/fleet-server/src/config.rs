use crate::layers::audit::DEFAULT_QUEUE_CAPACITY;
use crate::shared::entries::{ClusterEntry, PowerState};
use anyhow::{ensure, Context};
use protocol::rpc::{DEFAULT_SERVER_ADDR, STREAM_DEADLINE, UNARY_DEADLINE};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for every interval and deadline setting: one week.
const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub(crate) listen_addr: String,
    #[serde(default = "default_watch_interval_secs")]
    pub(crate) watch_interval_secs: u64,
    #[serde(default = "default_audit_queue_capacity")]
    pub(crate) audit_queue_capacity: usize,
    #[serde(default)]
    pub(crate) deadlines: DeadlineConfig,
    #[serde(default)]
    pub(crate) store: StoreConfig,
    #[serde(default)]
    pub(crate) control: ControlConfig,
    #[serde(default)]
    pub(crate) clusters: Vec<ClusterConfig>,
}

impl ServerConfig {
    pub(crate) fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub(crate) fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("invalid server config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.listen_addr.trim().is_empty(), "listen_addr must not be empty");
        ensure!(self.watch_interval_secs > 0, "watch_interval_secs must be positive");
        ensure!(self.audit_queue_capacity > 0, "audit_queue_capacity must be positive");
        ensure!(
            self.deadlines.unary_secs > 0 && self.deadlines.stream_secs > 0,
            "deadlines must be positive"
        );
        for (key, secs) in [
            ("watch_interval_secs", self.watch_interval_secs),
            ("deadlines.unary_secs", self.deadlines.unary_secs),
            ("deadlines.stream_secs", self.deadlines.stream_secs),
            ("control.transition_secs", self.control.transition_secs),
            ("control.poll_interval_ms", self.control.poll_interval_ms / 1000),
        ] {
            ensure!(
                secs <= MAX_INTERVAL_SECS,
                "{key} must not exceed {}",
                humantime::format_duration(Duration::from_secs(MAX_INTERVAL_SECS))
            );
        }
        for cluster in &self.clusters {
            ensure!(!cluster.name.is_empty(), "every [[clusters]] entry needs a name");
        }
        Ok(())
    }

    pub(crate) fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    pub(crate) fn entries(&self) -> Vec<ClusterEntry> {
        self.clusters.iter().map(ClusterConfig::to_entry).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct DeadlineConfig {
    pub(crate) unary_secs: u64,
    pub(crate) stream_secs: u64,
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            unary_secs: UNARY_DEADLINE.as_secs(),
            stream_secs: STREAM_DEADLINE.as_secs(),
        }
    }
}

impl DeadlineConfig {
    pub(crate) fn unary(&self) -> Duration {
        Duration::from_secs(self.unary_secs)
    }

    pub(crate) fn stream(&self) -> Duration {
        Duration::from_secs(self.stream_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct StoreConfig {
    pub(crate) dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct ControlConfig {
    pub(crate) transition_secs: u64,
    pub(crate) poll_interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            transition_secs: 30,
            poll_interval_ms: 500,
        }
    }
}

impl ControlConfig {
    pub(crate) fn transition(&self) -> Duration {
        Duration::from_secs(self.transition_secs)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClusterConfig {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) resource_group: String,
    #[serde(default)]
    pub(crate) cluster_name: String,
    #[serde(default)]
    pub(crate) power_state: PowerState,
}

impl ClusterConfig {
    fn to_entry(&self) -> ClusterEntry {
        ClusterEntry {
            name: self.name.clone(),
            resource_group: self.resource_group.clone(),
            cluster_name: self.cluster_name.clone(),
            power_state: self.power_state,
        }
    }

    /// Initial state in the simulated control plane; an unknown state boots
    /// as stopped.
    pub(crate) fn simulated_state(&self) -> (String, String, PowerState) {
        let state = match self.power_state {
            PowerState::Unknown => PowerState::Stopped,
            state => state,
        };
        (self.resource_group.clone(), self.cluster_name.clone(), state)
    }
}

fn default_listen_addr() -> String {
    DEFAULT_SERVER_ADDR.to_string()
}

fn default_watch_interval_secs() -> u64 {
    300
}

fn default_audit_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::parse("").expect("parse");
        assert_eq!(config.listen_addr, DEFAULT_SERVER_ADDR);
        assert_eq!(config.watch_interval(), Duration::from_secs(300));
        assert_eq!(config.audit_queue_capacity, 20);
        assert_eq!(config.deadlines.unary(), Duration::from_secs(300));
        assert_eq!(config.deadlines.stream(), Duration::from_secs(360));
        assert_eq!(config.store.dir, PathBuf::from("data"));
        assert!(config.clusters.is_empty());
    }

    #[test]
    fn clusters_become_entries() {
        let config = ServerConfig::parse(
            r#"
listen_addr = "0.0.0.0:19420"

[control]
transition_secs = 5
poll_interval_ms = 100

[[clusters]]
name = "Demo"
resource_group = "rg-demo"
cluster_name = "demo"
power_state = "Running"

[[clusters]]
name = "Placeholder"
"#,
        )
        .expect("parse");
        let entries = config.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].power_state, PowerState::Running);
        assert_eq!(entries[1].power_state, PowerState::Unknown);
        assert!(entries[1].cluster_name.is_empty());
        assert_eq!(
            config.clusters[1].simulated_state().2,
            PowerState::Stopped
        );
        assert_eq!(config.control.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ServerConfig::parse("audit_queue_capacity = 0").unwrap_err();
        assert!(err.to_string().contains("audit_queue_capacity"));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let err = ServerConfig::parse("[deadlines]\nstream_secs = 9223372036854775807\n")
            .unwrap_err();
        assert_eq!(err.to_string(), "deadlines.stream_secs must not exceed 7days");
        let err = ServerConfig::parse("watch_interval_secs = 604801").unwrap_err();
        assert!(err.to_string().starts_with("watch_interval_secs"));
        ServerConfig::parse("[deadlines]\nunary_secs = 604800\n").expect("one week is allowed");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleetd.toml");
        std::fs::write(&path, "watch_interval_secs = 60\n").expect("write");
        let config = ServerConfig::load(&path).expect("load");
        assert_eq!(config.watch_interval(), Duration::from_secs(60));
    }
}
