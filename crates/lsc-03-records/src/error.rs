use lsc_ledger_store::StoreError;
use shared_types::MathError;
use thiserror::Error;

/// Errors raised by the record ledgers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordsError {
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Amount arithmetic failed.
    #[error(transparent)]
    Math(#[from] MathError),

    /// Deposit record missing.
    #[error("Deposit record {0} not found")]
    DepositRecordNotFound(u64),

    /// No epoch unbonding record for this epoch.
    #[error("Epoch unbonding record {0} not found")]
    EpochUnbondingRecordNotFound(u64),

    /// The epoch record has no entry for the host zone.
    #[error("Host zone unbonding for {chain_id} in epoch {epoch} not found")]
    HostZoneUnbondingNotFound { epoch: u64, chain_id: String },

    /// User redemption record missing.
    #[error("User redemption record {0} not found")]
    UserRedemptionRecordNotFound(String),

    /// LSM deposit missing.
    #[error("LSM token deposit {chain_id}/{denom} not found")]
    LsmDepositNotFound { chain_id: String, denom: String },

    /// Status change outside the allowed edges.
    #[error("Invalid {record} transition {from} -> {to}")]
    InvalidTransition {
        record: &'static str,
        from: &'static str,
        to: &'static str,
    },

    /// Record-level invariant violated.
    #[error("Record invariant violated: {0}")]
    Invariant(String),
}

pub type RecordsResult<T> = Result<T, RecordsError>;
