use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to read source '{path}': {message}")]
    SourceRead { path: PathBuf, message: String },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Target store unavailable: {0}")]
    StoreConnection(String),

    #[error("Store operation failed: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
