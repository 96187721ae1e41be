//! Application configuration.

use std::path::{Path, PathBuf};

use gnb_parser::LogPaths;
use gnb_server::ServerConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Config file used when neither `--config` nor `GNB_EXPORTER_CONFIG` is set.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Locations of the gNB statistics logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsConfig {
    /// Physical layer statistics.
    #[serde(default = "default_l1_path")]
    pub l1: PathBuf,
    /// MAC scheduler statistics.
    #[serde(default = "default_mac_path")]
    pub mac: PathBuf,
    /// RRC statistics.
    #[serde(default = "default_rrc_path")]
    pub rrc: PathBuf,
}

fn default_l1_path() -> PathBuf {
    LogPaths::default().l1
}

fn default_mac_path() -> PathBuf {
    LogPaths::default().mac
}

fn default_rrc_path() -> PathBuf {
    LogPaths::default().rrc
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            l1: default_l1_path(),
            mac: default_mac_path(),
            rrc: default_rrc_path(),
        }
    }
}

impl From<LogsConfig> for LogPaths {
    fn from(cfg: LogsConfig) -> Self {
        Self {
            l1: cfg.l1,
            mac: cfg.mac,
            rrc: cfg.rrc,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logs: LogsConfig,
}

impl AppConfig {
    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_or_default(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}
