use crate::error::{RecordsError, RecordsResult};
use serde::{Deserialize, Serialize};
use shared_types::{Coin, Int};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LsmDepositStatus {
    TransferQueue,
    TransferInProgress,
    DetokenizationQueue,
    DetokenizationInProgress,
}

impl LsmDepositStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransferQueue => "TRANSFER_QUEUE",
            Self::TransferInProgress => "TRANSFER_IN_PROGRESS",
            Self::DetokenizationQueue => "DETOKENIZATION_QUEUE",
            Self::DetokenizationInProgress => "DETOKENIZATION_IN_PROGRESS",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use LsmDepositStatus::*;
        matches!(
            (self, next),
            (TransferQueue, TransferInProgress)
                | (TransferInProgress, TransferQueue)
                | (TransferInProgress, DetokenizationQueue)
                | (DetokenizationQueue, DetokenizationInProgress)
                | (DetokenizationInProgress, DetokenizationQueue)
        )
    }
}

/// Tokenized delegator shares deposited through an LSM liquid stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsmTokenDeposit {
    pub chain_id: String,
    /// Host-side denom, `{validator}/{record}`.
    pub denom: String,
    pub ibc_denom: String,
    pub staker_address: String,
    pub validator_address: String,
    /// Delegator shares represented by the tokens.
    pub amount: Int,
    pub st_token: Coin,
    pub status: LsmDepositStatus,
}

impl LsmTokenDeposit {
    pub fn transition(&mut self, next: LsmDepositStatus) -> RecordsResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(RecordsError::InvalidTransition {
                record: "lsm token deposit",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }
}
