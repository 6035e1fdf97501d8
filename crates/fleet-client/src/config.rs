use anyhow::Context;
use protocol::rpc::DEFAULT_SERVER_ADDR;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".fleetctl.toml";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("invalid input KV String: {0}")]
    InvalidPair(String),
    #[error("invalid input command: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ClientConfig {
    #[serde(default)]
    pub(crate) user: String,
    #[serde(default = "default_host")]
    pub(crate) host: String,
    #[serde(default = "default_port")]
    pub(crate) port: u16,
    #[serde(default)]
    pub(crate) tls: TlsConfig,
}

/// Carried and displayed only; connections are plain TCP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TlsConfig {
    #[serde(default)]
    pub(crate) use_tls: bool,
    #[serde(default)]
    pub(crate) ca_file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user: std::env::var("USER").unwrap_or_default(),
            host: default_host(),
            port: default_port(),
            tls: TlsConfig::default(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read config {}", path.display()))
            }
        };
        if raw.trim().is_empty() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!(event = "config.created", path = %path.display());
            return Ok(config);
        }
        toml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub(crate) fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to encode config")?;
        std::fs::write(path, raw).with_context(|| format!("failed to write config {}", path.display()))
    }

    pub(crate) fn update(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidPair(pair.to_string()))?;
        let (key, value) = (key.trim(), value.trim());
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "host" => self.host = value.to_string(),
            "port" => self.port = value.parse().map_err(|_| invalid())?,
            "usetls" => self.tls.use_tls = value.parse().map_err(|_| invalid())?,
            "cafile" => self.tls.ca_file = value.to_string(),
            "user" => self.user = value.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    pub(crate) fn show(&self) -> String {
        let mut text = String::from("--- Client Config ---\n");
        let _ = writeln!(text, "User: {}", self.user);
        let _ = writeln!(text, "Host Name: {}", self.host);
        let _ = writeln!(text, "Port: {}", self.port);
        let _ = writeln!(text, "Use TLS? {}", self.tls.use_tls);
        let _ = writeln!(text, "CA file: {}", self.tls.ca_file);
        text.push_str("---------------------\n");
        text
    }

    pub(crate) fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub(crate) fn default_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(CONFIG_FILE_NAME))
}

fn default_host() -> String {
    DEFAULT_SERVER_ADDR
        .rsplit_once(':')
        .map(|(host, _)| host.to_string())
        .unwrap_or_default()
}

fn default_port() -> u16 {
    DEFAULT_SERVER_ADDR
        .rsplit_once(':')
        .and_then(|(_, port)| port.parse().ok())
        .unwrap_or(19420)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("fleetctl.toml");
        let config = ClientConfig::load_or_create(&path).expect("load");
        assert_eq!(config.addr(), DEFAULT_SERVER_ADDR);
        assert!(!config.tls.use_tls);

        let reloaded = ClientConfig::load_or_create(&path).expect("reload");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn blank_file_is_replaced_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fleetctl.toml");
        std::fs::write(&path, "\n  \n").expect("write");
        ClientConfig::load_or_create(&path).expect("load");
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("port = 19420"), "{raw}");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
user = "alice"
host = "fleet.internal"

[tls]
use_tls = true
"#,
        )
        .expect("parse");
        assert_eq!(config.addr(), "fleet.internal:19420");
        assert!(config.tls.use_tls);
        assert!(config.tls.ca_file.is_empty());
    }

    #[test]
    fn update_accepts_known_keys() {
        let mut config = ClientConfig::default();
        config.update("host=10.0.0.5").expect("host");
        config.update("port = 2000").expect("port");
        config.update("usetls=true").expect("usetls");
        config.update("cafile=/etc/fleet/ca.pem").expect("cafile");
        config.update("user=bob").expect("user");
        assert_eq!(config.addr(), "10.0.0.5:2000");
        assert!(config.tls.use_tls);
        assert_eq!(config.tls.ca_file, "/etc/fleet/ca.pem");
        assert_eq!(config.user, "bob");
    }

    #[test]
    fn update_rejects_bad_input() {
        let mut config = ClientConfig::default();
        assert_eq!(
            config.update("host").unwrap_err().to_string(),
            "invalid input KV String: host"
        );
        assert_eq!(
            config.update("colour=blue").unwrap_err().to_string(),
            "invalid input command: colour"
        );
        assert!(matches!(
            config.update("port=http"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(config.port, 19420);
    }

    #[test]
    fn show_lists_every_field() {
        let mut config = ClientConfig::default();
        config.user = "alice".into();
        let text = config.show();
        assert!(text.starts_with("--- Client Config ---\n"));
        assert!(text.contains("User: alice\n"));
        assert!(text.contains("Host Name: 127.0.0.1\n"));
        assert!(text.contains("Use TLS? false\n"));
        assert!(text.ends_with("---------------------\n"));
    }
}
