use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::http::reader::ReadLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("service and admin listeners both use {0}")]
    SharedAddress(String),

    #[error("max_connections must be at least 1")]
    NoConnections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub admin: AdminConfig,
}

/// The public service listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub backlog: u32,
    pub max_connections: usize,
    pub read_timeout_ms: u64,
    pub idle_grace_ms: u64,
    pub max_message_size: usize,
}

/// The private listener that accepts the kill message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub listen_addr: String,
    /// Value of the `host` header the kill message must carry
    pub host: String,
    /// Exact body the kill message must carry
    pub passphrase: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            backlog: 128,
            max_connections: 512,
            read_timeout_ms: 10_000,
            idle_grace_ms: 200,
            max_message_size: 1024 * 1024,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:6000".to_string(),
            host: "localhost".to_string(),
            passphrase: "さようなら".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            idle_grace: Duration::from_millis(self.idle_grace_ms),
            max_message_size: self.max_message_size,
        }
    }
}

impl Config {
    /// Loads configuration for the process.
    ///
    /// Reads the YAML file named by `WICKET_CONFIG` when set, otherwise starts
    /// from defaults. `LISTEN` and `ADMIN_LISTEN` override the two addresses.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WICKET_CONFIG").ok();
        Self::load_from(path.as_deref().map(Path::new))
    }

    /// Like [`Config::load`], with an explicit file instead of `WICKET_CONFIG`.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = addr;
        }
        if let Ok(addr) = std::env::var("ADMIN_LISTEN") {
            cfg.admin.listen_addr = addr;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parses YAML. Missing sections and fields take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Port 0 asks the OS for a fresh port each time, so it never collides.
        let ephemeral = self.server.listen_addr.ends_with(":0");
        if self.server.listen_addr == self.admin.listen_addr && !ephemeral {
            return Err(ConfigError::SharedAddress(self.server.listen_addr.clone()));
        }
        if self.server.max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }
        Ok(())
    }
}
