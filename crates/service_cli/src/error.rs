//! CLI error types

use thiserror::Error;

/// Errors surfaced to the user by `optval`
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("Catalog configuration rejected: {0}")]
    Catalog(#[from] pricer_pricing::ConfigError),

    #[error("Invalid contract: {0}")]
    Contract(#[from] pricer_models::instruments::InstrumentError),

    #[error("Failed to serialise output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
