//! Common error types for rphoto

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for rphoto operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the rphoto crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Neither fresh data nor a cached record is available
    #[error("Not found: {0}")]
    NotFound(String),

    /// Atomic replace of a persisted file failed
    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
