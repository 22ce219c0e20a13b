use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable {0} must be set")]
    MissingCredential(&'static str),

    #[error("Ledger file not found: {}", .0.display())]
    LedgerNotFound(PathBuf),

    #[error("Failed reading ledger file {}: {source}", path.display())]
    LedgerRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ledger file {} is not valid JSON: {source}", path.display())]
    MalformedLedger {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Ledger purchases of {symbol} cannot be totalled: {source}")]
    LedgerOverflow {
        symbol: String,
        source: core_types::CoreError,
    },

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
