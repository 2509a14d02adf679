use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::store::{StoreLocation, DEFAULT_STORE_DIR, DEFAULT_STORE_FILE};

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "MONITOR_CONFIG";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MonitorConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_retry_delay_secs() -> u64 {
    30
}

fn default_store_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_DIR)
}

fn default_store_file() -> String {
    DEFAULT_STORE_FILE.to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            retry_delay_secs: default_retry_delay_secs(),
            store_dir: default_store_dir(),
            store_file: default_store_file(),
        }
    }
}

impl MonitorConfig {
    /// Defaults, or the file named by `MONITOR_CONFIG` when it is set.
    pub async fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load_file(&path).await,
            Err(_) => Ok(Self::default()),
        }
    }

    pub async fn load_file(file_path: impl AsRef<Path>) -> Result<Self> {
        let file_path = file_path.as_ref();
        if !file_path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", file_path.display()));
        }

        let content = fs::read_to_string(file_path).await?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate_log_level()?;
        Ok(config)
    }

    /// Get the log level as a tracing::Level
    pub fn get_tracing_level(&self) -> Result<tracing::Level> {
        parse_log_level(&self.log_level)
    }

    /// Validate the log level is one of the supported values
    pub fn validate_log_level(&self) -> Result<()> {
        self.get_tracing_level().map(|_| ())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn store_location(&self) -> StoreLocation {
        StoreLocation::new(self.store_dir.clone(), self.store_file.clone())
    }
}

pub fn parse_log_level(level: &str) -> Result<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" | "warning" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(anyhow::anyhow!(
            "Invalid log level: {}. Valid levels are: trace, debug, info, warn, error",
            level
        )),
    }
}
