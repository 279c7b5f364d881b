//! Configuration management for marsdash
//!
//! This module handles loading, validation, and management of
//! marsdash configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to ledger directory
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Main Beancount file name
    #[serde(default = "default_main_file")]
    pub main_file: String,
    /// Append-only annotation log (relative to data path unless absolute)
    #[serde(default = "default_overlay_file")]
    pub overlay_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            main_file: default_main_file(),
            overlay_file: default_overlay_file(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_main_file() -> String {
    "main.bean".to_string()
}

fn default_overlay_file() -> String {
    "user_transactions.jsonl".to_string()
}

/// Daily grid settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Account name prefixes tracked by the grid; empty tracks every account
    #[serde(default = "default_account_prefixes")]
    pub account_prefixes: Vec<String>,
    /// Reporting currency for balances
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Render a lone zero amount as an empty cell
    #[serde(default)]
    pub hide_zero: bool,
    /// Track accounts without postings inside the requested range
    #[serde(default)]
    pub include_idle_accounts: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            account_prefixes: default_account_prefixes(),
            currency: default_currency(),
            hide_zero: false,
            include_idle_accounts: false,
        }
    }
}

impl DashboardConfig {
    /// Whether an account is shown in the grid
    pub fn tracks(&self, account: &str) -> bool {
        self.account_prefixes.is_empty()
            || self.account_prefixes.iter().any(|p| account.starts_with(p.as_str()))
    }
}

fn default_account_prefixes() -> Vec<String> {
    vec!["Assets:Checking".to_string(), "Assets:Saving".to_string()]
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,
    /// Daily grid settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.dashboard.currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "dashboard.currency".to_string(),
                reason: "Currency must not be empty".to_string(),
            });
        }

        if self.data.overlay_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data.overlay_file".to_string(),
                reason: "Overlay file name must not be empty".to_string(),
            });
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Get the full path to the main ledger file
    pub fn ledger_path(&self) -> PathBuf {
        self.data.path.join(&self.data.main_file)
    }

    /// Get the full path to the annotation log
    pub fn overlay_path(&self) -> PathBuf {
        let file = PathBuf::from(&self.data.overlay_file);
        if file.is_absolute() {
            file
        } else {
            self.data.path.join(file)
        }
    }
}
