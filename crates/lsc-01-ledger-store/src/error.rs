//! Ledger store errors.

use thiserror::Error;

/// Errors raised by the store, its backends and the value codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Value could not be serialized.
    #[error("Failed to encode value: {0}")]
    Encode(String),

    /// Stored bytes do not decode into the requested type.
    #[error("Failed to decode value at key {key}: {reason}")]
    Decode { key: String, reason: String },

    /// `commit` or `rollback` called without a matching `begin`.
    #[error("No open write layer")]
    NoOpenLayer,

    /// Backend I/O failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
