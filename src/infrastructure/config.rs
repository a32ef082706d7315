//! Configuration infrastructure
//!
//! Settings for the sync orchestrator, persisted as JSON in the user
//! config directory. A missing file is replaced with defaults on first
//! run; the preset terms default to the store's smart-sync curation list.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Default values for every setting.
pub mod defaults {
    pub const BASE_URL: &str = "http://localhost:5000/api";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const POLL_INTERVAL_MS: u64 = 1_000;
    pub const INCLUDE_INACTIVE: bool = false;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_JSON_FORMAT: bool = false;

    /// Catalog curation terms for the "smart sync" preset: device families
    /// worth refreshing, minus accessory noise.
    pub const PRESET_INCLUDE_TERMS: &[&str] = &[
        "Apple", "iPhone", "iPad", "MacBook", "Android", "Samsung", "Galaxy", "Pixel", "Google",
    ];
    pub const PRESET_EXCLUDE_TERMS: &[&str] = &[
        "Accessory", "Accessories", "Cable", "Case", "Cover", "Protector", "Sleeve", "Bag",
        "Strap", "Mount", "Part",
    ];
}

/// Complete orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the store backend API.
    pub base_url: String,

    /// Timeout applied to every backend request.
    pub request_timeout_seconds: u64,

    /// Fixed interval between job status polls.
    pub poll_interval_ms: u64,

    /// Request inactive categories when fetching the catalog tree.
    pub include_inactive: bool,

    /// Terms for the bulk "smart sync" category preset.
    pub preset: PresetConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Include/exclude terms for the category preset. Matching is
/// case-insensitive substring over category names at any depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetConfig {
    pub include_terms: Vec<String>,
    pub exclude_terms: Vec<String>,
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Enable JSON formatted logs
    pub json_format: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::BASE_URL.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            include_inactive: defaults::INCLUDE_INACTIVE,
            preset: PresetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            include_terms: defaults::PRESET_INCLUDE_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_terms: defaults::PRESET_EXCLUDE_TERMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            json_format: defaults::LOG_JSON_FORMAT,
        }
    }
}

/// Configuration manager for loading and saving settings.
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory.
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("cex-sync");
        Ok(config_dir)
    }

    /// Create a new configuration manager pointing at the default path.
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("cex_sync_config.json");
        Ok(Self { config_path })
    }

    /// Load existing configuration, creating the file with defaults when
    /// this is the first run.
    pub async fn initialize_on_first_run(&self) -> Result<SyncConfig> {
        let config_dir = self
            .config_path
            .parent()
            .context("Failed to get config directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)
                .await
                .context("Failed to create config directory")?;
            info!("Created configuration directory: {:?}", config_dir);
        }

        if !self.config_path.exists() {
            info!("First run detected - writing default configuration");
            let default_config = SyncConfig::default();
            self.save_config(&default_config).await?;
            Ok(default_config)
        } else {
            self.load_config().await
        }
    }

    /// Load configuration from disk.
    pub async fn load_config(&self) -> Result<SyncConfig> {
        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", self.config_path))?;
        let config: SyncConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", self.config_path))?;
        Ok(config)
    }

    /// Save configuration to disk as pretty-printed JSON.
    pub async fn save_config(&self, config: &SyncConfig) -> Result<()> {
        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write config file: {:?}", self.config_path))?;
        Ok(())
    }
}
