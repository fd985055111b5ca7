//! Error types for the orchestrator.

use cosmwasm_std::OverflowError;
use lsc_epochs::EpochError;
use lsc_icacallbacks::CallbackError;
use lsc_interchain_query::QueryError;
use lsc_ledger_store::StoreError;
use lsc_records::RecordsError;
use shared_types::{Dec, Int, MathError};
use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeIbcError {
    /// No host zone registered under this chain id or denom.
    #[error("Host zone not found: {0}")]
    HostZoneNotFound(String),

    /// The zone is halted; user actions are rejected.
    #[error("Host zone {0} is halted")]
    HostZoneHalted(String),

    /// The stored redemption rate is outside the inner bounds.
    #[error("Redemption rate {rate} of {chain_id} is outside its bounds")]
    RedemptionRateOutOfBounds { chain_id: String, rate: Dec },

    /// Account cannot cover the amount.
    #[error("Insufficient {denom} balance for {address}: required {required}, available {available}")]
    InsufficientBalance {
        address: String,
        denom: String,
        required: Int,
        available: Int,
    },

    /// Amount converts to zero stTokens at the current rate.
    #[error("Liquid stake of {amount} mints no stTokens at rate {rate}")]
    InsufficientLiquidStake { amount: Int, rate: Dec },

    /// Amount must be positive.
    #[error("Amount must be positive")]
    ZeroAmount,

    /// Address does not parse under the expected bech32 prefix.
    #[error("Invalid address {address} (expected prefix {expected_prefix}): {reason}")]
    InvalidAddress {
        address: String,
        expected_prefix: String,
        reason: String,
    },

    /// Redemption record missing or not claimable.
    #[error("Invalid redemption record: {0}")]
    InvalidRedemptionRecord(String),

    /// No validator can take or return the amount.
    #[error("No delegation capacity: {0}")]
    NoDelegationCapacity(String),

    /// The transport rejected a submission synchronously.
    #[error("Remote submission failed: {0}")]
    RemoteSubmissionFailed(String),

    /// No callback row for the returned packet.
    #[error("Callback not found for {port_id}/{channel_id}/{sequence}")]
    CallbackNotFound {
        port_id: String,
        channel_id: String,
        sequence: u64,
    },

    /// Callback arguments or a message response failed to decode.
    #[error("Callback decode failed: {0}")]
    CallbackDecode(String),

    /// A record status change outside the allowed edges.
    #[error("Invalid state transition: {0}")]
    StateMachineTransitionInvalid(String),

    /// An internal invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Control message signer is not an admin.
    #[error("Unauthorized signer {0}")]
    Unauthorized(String),

    /// Control message carries an invalid configuration.
    #[error("Invalid control message: {0}")]
    InvalidControlMessage(String),

    /// LSM token does not resolve to an eligible validator.
    #[error("Invalid LSM token: {0}")]
    InvalidLsmToken(String),

    /// Query response for an unknown or expired query.
    #[error("Query response rejected: {0}")]
    QueryRejected(String),
}

impl StakeIbcError {
    /// Errors that must halt the zone when raised inside a handler.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl From<StoreError> for StakeIbcError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<MathError> for StakeIbcError {
    fn from(err: MathError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<OverflowError> for StakeIbcError {
    fn from(err: OverflowError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<EpochError> for StakeIbcError {
    fn from(err: EpochError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<RecordsError> for StakeIbcError {
    fn from(err: RecordsError) -> Self {
        match err {
            RecordsError::InvalidTransition { .. } => {
                Self::StateMachineTransitionInvalid(err.to_string())
            }
            RecordsError::UserRedemptionRecordNotFound(_)
            | RecordsError::EpochUnbondingRecordNotFound(_)
            | RecordsError::HostZoneUnbondingNotFound { .. } => {
                Self::InvalidRedemptionRecord(err.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CallbackError> for StakeIbcError {
    fn from(err: CallbackError) -> Self {
        match err {
            CallbackError::MalformedAck(reason) => Self::CallbackDecode(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueryError> for StakeIbcError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::NotFound(_) | QueryError::Expired { .. } => {
                Self::QueryRejected(err.to_string())
            }
            QueryError::InvalidRequest(reason) => Self::RemoteSubmissionFailed(reason),
            QueryError::Store(store) => Self::Internal(store.to_string()),
        }
    }
}

pub type StakeIbcResult<T> = Result<T, StakeIbcError>;
