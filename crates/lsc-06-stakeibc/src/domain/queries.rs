//! Interchain query kinds handled by the orchestrator.

use crate::error::{StakeIbcError, StakeIbcResult};
use serde::{Deserialize, Serialize};
use shared_types::{Dec, Int};

pub const VALIDATOR_EXCHANGE_RATE: &str = "validator_exchange_rate";
pub const DELEGATOR_SHARES: &str = "delegator_shares";
pub const WITHDRAWAL_BALANCE: &str = "withdrawal_balance";

/// Handler context stored with a query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryContext {
    Validator {
        chain_id: String,
        validator: String,
        /// Local delegation when the query was sent.
        delegation_at_submission: Int,
    },
    Zone {
        chain_id: String,
        /// Zone's `reward_sweep_generation` when the query was sent.
        sweep_generation: u64,
    },
}

impl QueryContext {
    pub fn chain_id(&self) -> &str {
        match self {
            Self::Validator { chain_id, .. } | Self::Zone { chain_id, .. } => chain_id,
        }
    }

    pub fn validator(&self) -> Option<&str> {
        match self {
            Self::Validator { validator, .. } => Some(validator),
            Self::Zone { .. } => None,
        }
    }
}

/// Verified host state returned by the relayer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostQueryResult {
    ExchangeRate { shares_to_tokens_rate: Dec },
    DelegatorShares { shares: Dec },
    Balance { amount: Int },
}

fn encode<T: Serialize>(value: &T) -> StakeIbcResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StakeIbcError::Internal(e.to_string()))
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> StakeIbcResult<T> {
    bincode::deserialize(bytes).map_err(|e| StakeIbcError::CallbackDecode(e.to_string()))
}

impl QueryContext {
    pub fn encode(&self) -> StakeIbcResult<Vec<u8>> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> StakeIbcResult<Self> {
        decode(bytes)
    }
}

impl HostQueryResult {
    pub fn encode(&self) -> StakeIbcResult<Vec<u8>> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> StakeIbcResult<Self> {
        decode(bytes)
    }
}
