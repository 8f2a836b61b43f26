//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{self, config_path};
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Daemon endpoint settings
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Protocol behaviour
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

/// Where to find the daemon
#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    /// Service name under `~/.fgp/services/`
    #[serde(default = "default_service")]
    pub service: String,

    /// Explicit socket path, overrides `service`
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            socket_path: None,
        }
    }
}

fn default_service() -> String {
    paths::DEFAULT_SERVICE.to_string()
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for establishing the socket connection
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Deadline for writing the request and reading the full response
    #[serde(default = "default_read")]
    pub read_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
            read_secs: default_read(),
        }
    }
}

fn default_connect() -> u64 {
    5
}
fn default_read() -> u64 {
    30
}

/// Protocol settings
#[derive(Debug, Deserialize, Default)]
pub struct ProtocolConfig {
    /// Reject responses whose echoed id differs from the request id
    #[serde(default)]
    pub strict_correlation: bool,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.timeouts.read_secs == 0 {
            return Err(Error::Config(
                "timeouts.read_secs must be greater than zero".to_string(),
            ));
        }
        if self.timeouts.connect_secs == 0 {
            return Err(Error::Config(
                "timeouts.connect_secs must be greater than zero".to_string(),
            ));
        }
        if self.daemon.socket_path.is_none() && self.daemon.service.is_empty() {
            return Err(Error::Config("daemon.service must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve the daemon socket path
    ///
    /// An explicit `socket_path` wins, otherwise the service's default
    /// location is used.
    pub fn socket_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.daemon.socket_path {
            return Ok(paths::expand_tilde(path));
        }
        paths::service_socket_path(&self.daemon.service).ok_or_else(|| {
            Error::Config("cannot determine home directory for the daemon socket".to_string())
        })
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.connect_secs)
    }

    /// Read deadline as a Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.read_secs)
    }
}
