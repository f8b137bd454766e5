//! Error types for cachefu operations

use std::path::PathBuf;
use thiserror::Error;

/// Disk tier errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiskError {
    #[error("Disk cache directory {path:?} is unavailable: {reason}")]
    DirectoryUnavailable { path: PathBuf, reason: String },

    #[error("I/O error during {operation} on {path:?}: {reason}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        reason: String,
    },

    #[error("Invalid cache file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: String },

    #[error("Disk cache is disabled")]
    Disabled,
}

impl DiskError {
    /// Build an `Io` error from a `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, err: &std::io::Error) -> Self {
        DiskError::Io {
            path: path.into(),
            operation,
            reason: err.to_string(),
        }
    }
}

/// Value encoding/decoding errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Encode failed: {reason}")]
    Encode { reason: String },

    #[error("Decode failed: {reason}")]
    Decode { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all cachefu errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Disk error: {0}")]
    Disk(#[from] DiskError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },
}

/// Result type alias for cachefu operations.
pub type CacheResult<T> = Result<T, CacheError>;

// =============================================================================
// TESTS
// =============================================================================
