//! Error types for the library layer.

use thiserror::Error;

/// Errors that stop a run. Per-row fetch failures and per-block parse
/// problems are recovered inside the agent and never surface here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid configuration (bad delay range, unreadable config file, ...).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A required header is missing from the header row.
    #[error("Column '{0}' not found in header row {1}")]
    MissingColumn(String, usize),
    /// The sheet ends before the configured header row.
    #[error("Sheet has {rows} rows; header row {header_row} does not exist")]
    SheetTooShort { rows: usize, header_row: usize },
    /// Reading or writing the CSV sheet failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The page session could not be started.
    #[error("Page session error: {0}")]
    Fetch(#[from] storefront_api::Error),
}

/// Errors from loading or validating [`crate::config::AgentConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}
