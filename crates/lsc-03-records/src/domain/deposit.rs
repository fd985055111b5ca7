use crate::error::{RecordsError, RecordsResult};
use serde::{Deserialize, Serialize};
use shared_types::Int;

/// Pipeline position of pooled deposits.
///
/// ```text
/// TRANSFER_QUEUE ⇄ TRANSFER_IN_PROGRESS → DELEGATION_QUEUE ⇄ DELEGATION_IN_PROGRESS → (deleted)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DepositRecordStatus {
    TransferQueue,
    TransferInProgress,
    DelegationQueue,
    DelegationInProgress,
}

impl DepositRecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransferQueue => "TRANSFER_QUEUE",
            Self::TransferInProgress => "TRANSFER_IN_PROGRESS",
            Self::DelegationQueue => "DELEGATION_QUEUE",
            Self::DelegationInProgress => "DELEGATION_IN_PROGRESS",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use DepositRecordStatus::*;
        matches!(
            (self, next),
            (TransferQueue, TransferInProgress)
                | (TransferInProgress, TransferQueue)
                | (TransferInProgress, DelegationQueue)
                | (DelegationQueue, DelegationInProgress)
                | (DelegationInProgress, DelegationQueue)
        )
    }
}

/// Where the pooled tokens came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositRecordSource {
    /// User liquid stakes, escrowed locally.
    StrideDeposit,
    /// Reinvested rewards, already on the delegation account.
    WithdrawalIca,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub id: u64,
    pub amount: Int,
    pub denom: String,
    pub host_zone_id: String,
    pub status: DepositRecordStatus,
    pub deposit_epoch_number: u64,
    pub source: DepositRecordSource,
}

impl DepositRecord {
    /// Record awaiting id allocation by the keeper.
    pub fn new(
        host_zone_id: impl Into<String>,
        denom: impl Into<String>,
        amount: Int,
        status: DepositRecordStatus,
        source: DepositRecordSource,
        deposit_epoch_number: u64,
    ) -> Self {
        Self {
            id: 0,
            amount,
            denom: denom.into(),
            host_zone_id: host_zone_id.into(),
            status,
            deposit_epoch_number,
            source,
        }
    }

    pub fn transition(&mut self, next: DepositRecordStatus) -> RecordsResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(RecordsError::InvalidTransition {
                record: "deposit record",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }
}
