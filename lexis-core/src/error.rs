//! Error types for Lexis operations

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the cache tiers and the persistence layer.
///
/// Missing content is not represented here: an absent string resolves to
/// the empty string once fallback is exhausted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid cache key '{key}': {reason}")]
    InvalidCacheKey { key: String, reason: String },

    #[error("Unsupported persistence backend: {driver}")]
    UnsupportedBackend { driver: String },

    #[error("Cache store operation {operation} failed: {reason}")]
    CacheFailed { operation: String, reason: String },

    #[error("Persistence operation {operation} failed: {reason}")]
    PersistenceFailed { operation: String, reason: String },

    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: String, limit: Duration },

    #[error("Storage lock poisoned")]
    LockPoisoned,
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

/// Master error type for all Lexis errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexisError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl LexisError {
    /// True when a cache store refused a derived key.
    pub fn is_invalid_cache_key(&self) -> bool {
        matches!(self, Self::Storage(StorageError::InvalidCacheKey { .. }))
    }

    /// True when a collaborator call exceeded the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Timeout { .. }))
    }
}

/// Result type alias for Lexis operations.
pub type LexisResult<T> = Result<T, LexisError>;

// =============================================================================
// TESTS
// =============================================================================
