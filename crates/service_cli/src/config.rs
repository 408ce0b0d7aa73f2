//! CLI configuration management
//!
//! Handles loading configuration from TOML files, environment variables, and
//! command-line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use pricer_pricing::ValuationConfig;
use serde::Deserialize;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid output format: {0}. Must be one of: table, json")]
    InvalidOutputFormat(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error(transparent)]
    Valuation(#[from] pricer_pricing::ConfigError),
}

/// Log levels supported by the CLI
///
/// Parsed case-insensitively from files, the environment and flags alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::InvalidOutputFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// CLI configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Fallback log level when `RUST_LOG` is unset
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Output format
    #[serde(deserialize_with = "deserialize_output_format")]
    pub output_format: OutputFormat,
    /// Catalog settings
    pub valuation: ValuationConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_output_format<'de, D>(deserializer: D) -> Result<OutputFormat, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    OutputFormat::from_str(&s).map_err(serde::de::Error::custom)
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Apply `PRICER_LOG_LEVEL`, `PRICER_OUTPUT_FORMAT` and the valuation
    /// `PRICER_*` variables
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        let mut config = self.with_overrides(|name| std::env::var(name).ok())?;
        config.valuation = config.valuation.with_env_override()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("PRICER_LOG_LEVEL") {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(format) = lookup("PRICER_OUTPUT_FORMAT") {
            self.output_format = OutputFormat::from_str(&format)?;
        }
        Ok(self)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        if let Some(format) = cli.output_format {
            self.output_format = format;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(self.valuation.validate()?)
    }
}

/// Global flags that override configuration
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<LogLevel>,
    /// Output format override
    pub output_format: Option<OutputFormat>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<CliConfig, ConfigError> {
    let config = match &cli.config_file {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };

    let mut config = config.with_env_override()?;
    config.merge_with_cli(cli);
    config.validate()?;

    Ok(config)
}
