//! RelAnn Configuration Management
//!
//! Handles configuration from environment variables and TOML config files
//! with defaults pointing at locally running services.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// External service endpoints
    pub services: ServiceConfig,

    /// Review behaviour
    pub review: ReviewConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    ///
    /// Every variable that is set wins over the loaded value, including
    /// values equal to the defaults.
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(url) = var("RELANN_EXTRACTION_URL") {
            self.services.extraction_url = url;
        }
        if let Some(url) = var("RELANN_PERSISTENCE_URL") {
            self.services.persistence_url = url;
        }
        if let Some(url) = var("RELANN_QUEUE_URL") {
            self.services.queue_url = url;
        }
        if let Some(secs) = var("RELANN_TIMEOUT_SECS") {
            self.services.timeout_secs = secs.parse().map_err(|_| ConfigError::InvalidValue {
                key: "RELANN_TIMEOUT_SECS".to_string(),
                value: secs,
            })?;
        }

        if let Some(dedup) = var("RELANN_DEDUP") {
            self.review.dedup_on_confirm = parse_bool("RELANN_DEDUP", &dedup)?;
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = var("LOG_JSON") {
            self.logging.json_format = parse_bool("LOG_JSON", &json)?;
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// External service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Extraction endpoint (POST sentence, returns candidates)
    pub extraction_url: String,

    /// Persistence endpoint (POST confirmed instances)
    pub persistence_url: String,

    /// Sentence queue endpoint (GET next, POST skip)
    pub queue_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            extraction_url: "http://127.0.0.1:8000/predict/all".to_string(),
            persistence_url: "http://127.0.0.1:3000/rel_extract/add_instance".to_string(),
            queue_url: "http://127.0.0.1:8000/sentence".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Review behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Drop repeated triples from the accepted and rejected sets on confirm
    pub dedup_on_confirm: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
