// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-18

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },
}

/// Oracle endpoint and address-table location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub oracle_host: String,
    pub oracle_port: u16,
    pub timeout_ms: u64,
    pub addr_table: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            oracle_host: "127.0.0.1".into(),
            oracle_port: 6678,
            timeout_ms: 10_000,
            addr_table: PathBuf::from("/root/data/addr.txt"),
        }
    }
}

impl EngineConfig {
    /// Read a TOML file. Keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Defaults overlaid with `CALLSPLICE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = std::env::var("CALLSPLICE_ORACLE_HOST") {
            self.oracle_host = host;
        }
        if let Ok(port) = std::env::var("CALLSPLICE_ORACLE_PORT") {
            self.oracle_port = port.parse().map_err(|_| ConfigError::Env {
                key: "CALLSPLICE_ORACLE_PORT",
                value: port,
            })?;
        }
        if let Ok(ms) = std::env::var("CALLSPLICE_ORACLE_TIMEOUT_MS") {
            self.timeout_ms = ms.parse().map_err(|_| ConfigError::Env {
                key: "CALLSPLICE_ORACLE_TIMEOUT_MS",
                value: ms,
            })?;
        }
        if let Ok(path) = std::env::var("CALLSPLICE_ADDR_TABLE") {
            self.addr_table = PathBuf::from(path);
        }
        Ok(self)
    }

    pub fn oracle_url(&self) -> String {
        format!("http://{}:{}/", self.oracle_host, self.oracle_port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
