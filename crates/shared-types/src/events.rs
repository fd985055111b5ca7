//! # Stake Events
//!
//! Every observable state change of the coordinator. Handlers push these into
//! the block context; events emitted inside a rolled-back branch are dropped
//! with it, so subscribers only ever see committed effects.

use crate::math::{Dec, Int};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a remote call resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallbackOutcome {
    Success,
    Failure,
    Timeout,
}

impl CallbackOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for CallbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events emitted by the ledgers and the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeEvent {
    // =========================================================================
    // USER ACTIONS
    // =========================================================================
    LiquidStake {
        chain_id: String,
        staker: String,
        native_amount: Int,
        st_amount: Int,
    },
    LsmLiquidStake {
        chain_id: String,
        staker: String,
        validator: String,
        lsm_denom: String,
        shares: Int,
        st_amount: Int,
    },
    RedeemStake {
        chain_id: String,
        redeemer: String,
        receiver: String,
        st_amount: Int,
        epoch: u64,
    },
    ClaimSubmitted {
        chain_id: String,
        redemption_id: String,
        native_amount: Int,
    },
    ClaimCompleted {
        chain_id: String,
        redemption_id: String,
        native_amount: Int,
    },
    ClaimFailed {
        chain_id: String,
        redemption_id: String,
    },

    // =========================================================================
    // REMOTE CALLS
    // =========================================================================
    RemoteCallSubmitted {
        chain_id: String,
        callback_id: String,
        port_id: String,
        channel_id: String,
        sequence: u64,
        messages: usize,
    },
    CallbackResolved {
        chain_id: String,
        callback_id: String,
        sequence: u64,
        outcome: CallbackOutcome,
    },
    CallbackMissing {
        port_id: String,
        channel_id: String,
        sequence: u64,
    },

    // =========================================================================
    // ACCOUNTING
    // =========================================================================
    DelegationApplied {
        chain_id: String,
        validator: String,
        amount: Int,
    },
    UndelegationApplied {
        chain_id: String,
        epoch: u64,
        native_amount: Int,
        st_burned: Int,
    },
    Redelegated {
        chain_id: String,
        src_validator: String,
        dst_validator: String,
        amount: Int,
    },
    RewardsReinvested {
        chain_id: String,
        reinvest_amount: Int,
        fee_amount: Int,
    },
    UnbondingClaimable {
        chain_id: String,
        epoch: u64,
    },
    SlashDetected {
        chain_id: String,
        validator: String,
        slashed_tokens: Int,
        new_rate: Dec,
    },

    // =========================================================================
    // REDEMPTION RATE & SAFETY
    // =========================================================================
    RedemptionRateUpdated {
        chain_id: String,
        previous: Dec,
        current: Dec,
    },
    RedemptionRateFrozen {
        chain_id: String,
        rate: Dec,
    },
    HostZoneHalted {
        chain_id: String,
        reason: String,
    },
    HostZoneResumed {
        chain_id: String,
    },

    // =========================================================================
    // CONTROL PLANE
    // =========================================================================
    HostZoneRegistered {
        chain_id: String,
    },
    ValidatorAdded {
        chain_id: String,
        validator: String,
        weight: u64,
    },
    ValidatorRemoved {
        chain_id: String,
        validator: String,
    },
    ValidatorWeightChanged {
        chain_id: String,
        validator: String,
        weight: u64,
    },
    RedemptionBoundsUpdated {
        chain_id: String,
    },

    // =========================================================================
    // QUERIES, EPOCHS, MIGRATIONS
    // =========================================================================
    QuerySubmitted {
        chain_id: String,
        query_id: String,
        callback_id: String,
    },
    QueryResolved {
        chain_id: String,
        query_id: String,
        callback_id: String,
    },
    QueryExpired {
        chain_id: String,
        query_id: String,
        callback_id: String,
    },
    EpochEnded {
        identifier: String,
        epoch_number: u64,
    },
    MigrationApplied {
        name: String,
    },
}

impl StakeEvent {
    /// Host zone the event concerns, if any.
    #[must_use]
    pub fn chain_id(&self) -> Option<&str> {
        match self {
            Self::LiquidStake { chain_id, .. }
            | Self::LsmLiquidStake { chain_id, .. }
            | Self::RedeemStake { chain_id, .. }
            | Self::ClaimSubmitted { chain_id, .. }
            | Self::ClaimCompleted { chain_id, .. }
            | Self::ClaimFailed { chain_id, .. }
            | Self::RemoteCallSubmitted { chain_id, .. }
            | Self::CallbackResolved { chain_id, .. }
            | Self::DelegationApplied { chain_id, .. }
            | Self::UndelegationApplied { chain_id, .. }
            | Self::Redelegated { chain_id, .. }
            | Self::RewardsReinvested { chain_id, .. }
            | Self::UnbondingClaimable { chain_id, .. }
            | Self::SlashDetected { chain_id, .. }
            | Self::RedemptionRateUpdated { chain_id, .. }
            | Self::RedemptionRateFrozen { chain_id, .. }
            | Self::HostZoneHalted { chain_id, .. }
            | Self::HostZoneResumed { chain_id }
            | Self::HostZoneRegistered { chain_id }
            | Self::ValidatorAdded { chain_id, .. }
            | Self::ValidatorRemoved { chain_id, .. }
            | Self::ValidatorWeightChanged { chain_id, .. }
            | Self::RedemptionBoundsUpdated { chain_id }
            | Self::QuerySubmitted { chain_id, .. }
            | Self::QueryResolved { chain_id, .. }
            | Self::QueryExpired { chain_id, .. } => Some(chain_id),
            Self::CallbackMissing { .. } | Self::EpochEnded { .. } | Self::MigrationApplied { .. } => {
                None
            }
        }
    }

    /// Stable snake_case name, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LiquidStake { .. } => "liquid_stake",
            Self::LsmLiquidStake { .. } => "lsm_liquid_stake",
            Self::RedeemStake { .. } => "redeem_stake",
            Self::ClaimSubmitted { .. } => "claim_submitted",
            Self::ClaimCompleted { .. } => "claim_completed",
            Self::ClaimFailed { .. } => "claim_failed",
            Self::RemoteCallSubmitted { .. } => "remote_call_submitted",
            Self::CallbackResolved { .. } => "callback_resolved",
            Self::CallbackMissing { .. } => "callback_missing",
            Self::DelegationApplied { .. } => "delegation_applied",
            Self::UndelegationApplied { .. } => "undelegation_applied",
            Self::Redelegated { .. } => "redelegated",
            Self::RewardsReinvested { .. } => "rewards_reinvested",
            Self::UnbondingClaimable { .. } => "unbonding_claimable",
            Self::SlashDetected { .. } => "slash_detected",
            Self::RedemptionRateUpdated { .. } => "redemption_rate_updated",
            Self::RedemptionRateFrozen { .. } => "redemption_rate_frozen",
            Self::HostZoneHalted { .. } => "host_zone_halted",
            Self::HostZoneResumed { .. } => "host_zone_resumed",
            Self::HostZoneRegistered { .. } => "host_zone_registered",
            Self::ValidatorAdded { .. } => "validator_added",
            Self::ValidatorRemoved { .. } => "validator_removed",
            Self::ValidatorWeightChanged { .. } => "validator_weight_changed",
            Self::RedemptionBoundsUpdated { .. } => "redemption_bounds_updated",
            Self::QuerySubmitted { .. } => "query_submitted",
            Self::QueryResolved { .. } => "query_resolved",
            Self::QueryExpired { .. } => "query_expired",
            Self::EpochEnded { .. } => "epoch_ended",
            Self::MigrationApplied { .. } => "migration_applied",
        }
    }
}
