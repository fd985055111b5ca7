use crate::error::{RecordsError, RecordsResult};
use serde::{Deserialize, Serialize};
use shared_types::Int;

/// Lifecycle of one zone's redemptions within an epoch.
///
/// Statuses only move forward in declaration order, except for the two
/// revert edges taken when a remote call fails:
/// `UNBONDING_IN_PROGRESS → UNBONDING_QUEUE` and
/// `EXIT_TRANSFER_IN_PROGRESS → EXIT_TRANSFER_QUEUE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HostZoneUnbondingStatus {
    UnbondingQueue,
    UnbondingInProgress,
    ExitTransferQueue,
    ExitTransferInProgress,
    Claimable,
}

impl HostZoneUnbondingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnbondingQueue => "UNBONDING_QUEUE",
            Self::UnbondingInProgress => "UNBONDING_IN_PROGRESS",
            Self::ExitTransferQueue => "EXIT_TRANSFER_QUEUE",
            Self::ExitTransferInProgress => "EXIT_TRANSFER_IN_PROGRESS",
            Self::Claimable => "CLAIMABLE",
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        use HostZoneUnbondingStatus::*;
        match (self, next) {
            (UnbondingInProgress, UnbondingQueue) => true,
            (ExitTransferInProgress, ExitTransferQueue) => true,
            // tokens only leave the validators through an undelegation
            (UnbondingQueue, to) => to == UnbondingInProgress,
            (from, to) => to > from,
        }
    }

    /// Statuses in which users may claim.
    pub fn is_claimable_phase(self) -> bool {
        self >= Self::ExitTransferQueue
    }
}

/// One host zone's share of an epoch's redemptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostZoneUnbonding {
    pub host_zone_id: String,
    pub st_token_amount: Int,
    /// Native tokens actually unbonded so far.
    pub native_token_amount: Int,
    pub denom: String,
    pub status: HostZoneUnbondingStatus,
    /// Seconds; latest completion time reported by the host.
    pub unbonding_time: u64,
    pub user_redemption_records: Vec<String>,
    pub undelegation_txs_in_progress: u32,
    /// Escrowed stTokens not yet burned against a confirmed undelegation.
    pub st_tokens_to_burn: Int,
    /// Native tokens still to be undelegated in the current attempt.
    pub native_tokens_to_unbond: Int,
}

impl HostZoneUnbonding {
    pub fn new(host_zone_id: impl Into<String>, denom: impl Into<String>) -> Self {
        Self {
            host_zone_id: host_zone_id.into(),
            st_token_amount: Int::zero(),
            native_token_amount: Int::zero(),
            denom: denom.into(),
            status: HostZoneUnbondingStatus::UnbondingQueue,
            unbonding_time: 0,
            user_redemption_records: Vec::new(),
            undelegation_txs_in_progress: 0,
            st_tokens_to_burn: Int::zero(),
            native_tokens_to_unbond: Int::zero(),
        }
    }

    pub fn transition(&mut self, next: HostZoneUnbondingStatus) -> RecordsResult<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(RecordsError::InvalidTransition {
                record: "host zone unbonding",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Non-empty redemption lists imply a positive stToken amount.
    pub fn validate(&self) -> RecordsResult<()> {
        if !self.user_redemption_records.is_empty() && self.st_token_amount.is_zero() {
            return Err(RecordsError::Invariant(format!(
                "unbonding for {} lists redemptions but holds no stTokens",
                self.host_zone_id
            )));
        }
        Ok(())
    }

    pub fn add_redemption_id(&mut self, id: &str) {
        if !self.user_redemption_records.iter().any(|existing| existing == id) {
            self.user_redemption_records.push(id.to_string());
        }
    }

    pub fn remove_redemption_id(&mut self, id: &str) {
        self.user_redemption_records.retain(|existing| existing != id);
    }
}

/// All host zones' unbondings opened during one stride epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochUnbondingRecord {
    pub epoch_number: u64,
    pub host_zone_unbondings: Vec<HostZoneUnbonding>,
}

impl EpochUnbondingRecord {
    pub fn new(epoch_number: u64) -> Self {
        Self {
            epoch_number,
            host_zone_unbondings: Vec::new(),
        }
    }

    pub fn host_zone_unbonding(&self, chain_id: &str) -> Option<&HostZoneUnbonding> {
        self.host_zone_unbondings
            .iter()
            .find(|hzu| hzu.host_zone_id == chain_id)
    }

    /// Inserts or replaces the entry for `unbonding.host_zone_id`.
    pub fn upsert(&mut self, unbonding: HostZoneUnbonding) {
        match self
            .host_zone_unbondings
            .iter_mut()
            .find(|hzu| hzu.host_zone_id == unbonding.host_zone_id)
        {
            Some(existing) => *existing = unbonding,
            None => self.host_zone_unbondings.push(unbonding),
        }
    }

    pub fn remove(&mut self, chain_id: &str) {
        self.host_zone_unbondings
            .retain(|hzu| hzu.host_zone_id != chain_id);
    }
}
