//! Error types for the cache library

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the cache and its file handles
#[derive(Debug, Error)]
pub enum CacheError {
    /// Key is empty or contains one of `{ } ( ) / \ @`
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Time-to-live is not a non-negative duration
    #[error("invalid ttl: {0}")]
    InvalidTtl(String),

    /// Cache directory failed the construction-time checks
    #[error("invalid cache directory {path:?}: {reason}")]
    InvalidDirectory { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized
    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    /// Stored content could not be turned back into a value
    #[error("failed to decode cached content: {0}")]
    Decode(String),
}

impl CacheError {
    pub fn invalid_directory(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CacheError::InvalidDirectory {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
