//! Error types for the study service
//!
//! Missing inputs (absent directories, empty folders, no table yet) never
//! surface here: they degrade to fewer results. What remains are the
//! conditions that abort an interaction.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Study service error types
#[derive(Error, Debug)]
pub enum Error {
    /// Session id not present in the registry
    #[error("Session not found: {0}\nStart a new session with POST /v1/sessions")]
    SessionNotFound(String),

    /// Caller supplied a value the operation cannot accept
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough observations for a statistic
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Response table or interaction log could not be read or written
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encode/decode error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
