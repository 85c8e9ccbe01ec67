//! Error types for the cache
//!
//! Provides unified error handling using thiserror. None of these errors cross
//! the `CacheService` boundary: the service logs them and degrades to a miss.

use thiserror::Error;

// == Storage Error Enum ==
/// Failures reported by a persistent key/value store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store could not be read
    #[error("Storage read failed: {0}")]
    Read(String),

    /// The store rejected a write
    #[error("Storage write failed: {0}")]
    Write(String),

    /// The write would exceed the configured byte quota
    #[error("Storage quota exceeded: {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },

    /// The backing file holds something other than a JSON object of strings
    #[error("Storage is corrupt: {0}")]
    Corrupt(String),

    /// Underlying filesystem error
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Cache Error Enum ==
/// Internal error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Persistent tier failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A value could not be encoded for storage
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A stored entry or payload could not be decoded
    #[error("Malformed entry for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache internals.
pub type Result<T> = std::result::Result<T, CacheError>;
