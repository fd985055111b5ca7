use lsc_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpochError {
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No epoch registered under this identifier.
    #[error("Epoch not found: {0}")]
    NotFound(String),

    /// An epoch with this identifier already exists.
    #[error("Duplicate epoch identifier: {0}")]
    Duplicate(String),

    /// Epoch durations must be positive.
    #[error("Epoch {0} has zero duration")]
    ZeroDuration(String),
}

pub type EpochResult<T> = Result<T, EpochError>;
