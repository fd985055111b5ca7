//! Arguments persisted with each callback row, one variant per callback id.

use super::allocation::{Rebalancing, ValidatorAmount};
use crate::error::{StakeIbcError, StakeIbcResult};
use serde::{Deserialize, Serialize};
use shared_types::Int;

pub const NATIVE_TRANSFER: &str = "native_transfer";
pub const DELEGATE: &str = "delegate";
pub const UNDELEGATE: &str = "undelegate";
pub const CLAIM: &str = "claim";
pub const REINVEST: &str = "reinvest";
pub const REBALANCE: &str = "rebalance";
pub const REDEMPTION: &str = "redemption";
pub const CLAIM_UNDELEGATION: &str = "claim_undelegation";
pub const LSM_TRANSFER: &str = "lsm_transfer";
pub const DETOKENIZE: &str = "detokenize";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackArgs {
    NativeTransfer {
        chain_id: String,
        deposit_record_id: u64,
        amount: Int,
    },
    Delegate {
        chain_id: String,
        deposit_record_id: u64,
        splits: Vec<ValidatorAmount>,
    },
    Undelegate {
        chain_id: String,
        epoch: u64,
        splits: Vec<ValidatorAmount>,
        /// Escrowed stTokens burned when this chunk succeeds.
        st_tokens_to_burn: Int,
    },
    Claim {
        chain_id: String,
    },
    Reinvest {
        chain_id: String,
        reinvest_amount: Int,
        fee_amount: Int,
    },
    Rebalance {
        chain_id: String,
        rebalancings: Vec<Rebalancing>,
    },
    Redemption {
        chain_id: String,
        epochs: Vec<u64>,
    },
    ClaimUndelegation {
        chain_id: String,
        user_redemption_record_id: String,
        epoch: u64,
    },
    LsmTransfer {
        chain_id: String,
        denom: String,
    },
    Detokenize {
        chain_id: String,
        denom: String,
    },
}

impl CallbackArgs {
    pub fn callback_id(&self) -> &'static str {
        match self {
            Self::NativeTransfer { .. } => NATIVE_TRANSFER,
            Self::Delegate { .. } => DELEGATE,
            Self::Undelegate { .. } => UNDELEGATE,
            Self::Claim { .. } => CLAIM,
            Self::Reinvest { .. } => REINVEST,
            Self::Rebalance { .. } => REBALANCE,
            Self::Redemption { .. } => REDEMPTION,
            Self::ClaimUndelegation { .. } => CLAIM_UNDELEGATION,
            Self::LsmTransfer { .. } => LSM_TRANSFER,
            Self::Detokenize { .. } => DETOKENIZE,
        }
    }

    pub fn chain_id(&self) -> &str {
        match self {
            Self::NativeTransfer { chain_id, .. }
            | Self::Delegate { chain_id, .. }
            | Self::Undelegate { chain_id, .. }
            | Self::Claim { chain_id }
            | Self::Reinvest { chain_id, .. }
            | Self::Rebalance { chain_id, .. }
            | Self::Redemption { chain_id, .. }
            | Self::ClaimUndelegation { chain_id, .. }
            | Self::LsmTransfer { chain_id, .. }
            | Self::Detokenize { chain_id, .. } => chain_id,
        }
    }

    pub fn encode(&self) -> StakeIbcResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StakeIbcError::Internal(e.to_string()))
    }

    /// Decodes and checks the variant against the row's callback id.
    pub fn decode(callback_id: &str, bytes: &[u8]) -> StakeIbcResult<Self> {
        let args: Self =
            bincode::deserialize(bytes).map_err(|e| StakeIbcError::CallbackDecode(e.to_string()))?;
        if args.callback_id() != callback_id {
            return Err(StakeIbcError::CallbackDecode(format!(
                "row {callback_id} carries {} arguments",
                args.callback_id()
            )));
        }
        Ok(args)
    }
}
