//! Configuration handling for tiledb-cli
//!
//! Configuration is stored in `~/.config/tiledb-cli/config.toml` (or the
//! platform equivalent) and can be pointed elsewhere with
//! `TILEDB_CLI_CONFIG`. `TILEDB_CLI_BACKEND` and `TILEDB_CLI_BRIDGE`
//! override the engine section.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OutputFormat;

pub const CONFIG_ENV: &str = "TILEDB_CLI_CONFIG";
pub const BACKEND_ENV: &str = "TILEDB_CLI_BACKEND";
pub const BRIDGE_ENV: &str = "TILEDB_CLI_BRIDGE";

/// Bridge executable looked up on PATH by default
pub const DEFAULT_BRIDGE: &str = "tiledb-bridge";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which backend executes engine requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Bridge,
    Echo,
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bridge" => Ok(BackendKind::Bridge),
            "echo" => Ok(BackendKind::Echo),
            other => Err(ConfigError::Invalid(format!(
                "unknown backend '{}': expected 'bridge' or 'echo'",
                other
            ))),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub backend: BackendKind,

    /// Bridge executable
    pub command: String,

    /// Extra arguments passed to the bridge
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Bridge,
            command: DEFAULT_BRIDGE.to_string(),
            args: Vec::new(),
        }
    }
}

/// TileDB Cloud defaults for `cloud login`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudConfig {
    /// Host to log in to; the cloud client's default when unset
    pub host: Option<String>,

    /// Threads for concurrent requests
    pub threads: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            host: None,
            threads: 16,
        }
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    pub engine: EngineConfig,

    pub cloud: CloudConfig,
}

impl Config {
    /// Loads configuration from the default location plus environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.is_file() => {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                Self::parse(&content)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?
            }
            _ => Self::default(),
        };

        config.apply_overrides(
            std::env::var(BACKEND_ENV).ok().as_deref(),
            std::env::var(BRIDGE_ENV).ok().as_deref(),
        )?;

        Ok(config)
    }

    /// Parses a TOML configuration document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Returns the config file path (`TILEDB_CLI_CONFIG` wins)
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        ProjectDirs::from("io", "tiledb", "tiledb-cli")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Applies backend and bridge overrides
    pub fn apply_overrides(
        &mut self,
        backend: Option<&str>,
        bridge: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(backend) = backend.filter(|b| !b.trim().is_empty()) {
            self.engine.backend = backend.parse()?;
        }

        if let Some(bridge) = bridge.filter(|b| !b.trim().is_empty()) {
            self.engine.command = bridge.to_string();
        }

        Ok(())
    }
}
