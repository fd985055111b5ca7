//! Runtime errors.

use lsc_epochs::EpochError;
use lsc_ledger_store::StoreError;
use lsc_stakeibc::StakeIbcError;
use shared_types::BlockHeight;
use thiserror::Error;

/// Errors that abort a whole block or the node start-up.
///
/// A rejected transaction is not one of them: it is rolled back on its own
/// and reported in its `TxResult`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Ledger store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Epoch bookkeeping failure.
    #[error("Epoch error: {0}")]
    Epoch(#[from] EpochError),

    /// Orchestrator failure outside a transaction branch.
    #[error("Orchestrator error: {0}")]
    StakeIbc(#[from] StakeIbcError),

    /// Invalid node configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A migration failed; nothing it wrote was kept.
    #[error("Migration {name} failed: {reason}")]
    Migration { name: String, reason: String },

    /// Two migrations registered under one name.
    #[error("Migration {0} registered twice")]
    DuplicateMigration(String),

    /// Block header does not follow the last committed one.
    #[error("Block {got} out of order: expected height {expected} at or after time {min_time}")]
    BlockOutOfOrder {
        expected: BlockHeight,
        got: BlockHeight,
        min_time: u64,
    },
}

/// Result alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
