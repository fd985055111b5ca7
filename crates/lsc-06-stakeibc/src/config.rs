//! Orchestrator parameters.

use serde::{Deserialize, Serialize};
use shared_types::math::BPS_DENOMINATOR;
use shared_types::{NANOS_PER_SECOND, SECONDS_PER_DAY};

const ONE_DAY_NANOS: u64 = SECONDS_PER_DAY * NANOS_PER_SECOND;

/// Tunables shared by every host zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Relative timeout of interchain-account txs.
    pub ica_timeout_nanos: u64,

    /// Relative timeout of token transfers to the host.
    pub ibc_transfer_timeout_nanos: u64,

    /// Share of reinvested rewards sent to the fee account.
    pub stride_commission_bps: u64,

    /// Delegation change, as a share of total delegations, that triggers an
    /// exchange-rate query for a validator.
    pub slash_query_threshold_bps: u64,

    /// Largest slash a delegator-shares reconciliation may apply.
    pub max_slash_bps: u64,

    /// Validators with this many changes in flight take no new delegations.
    pub max_delegation_changes_in_progress: u32,

    /// Day epochs between rebalances; `None` uses the zone's unbonding period.
    pub rebalance_interval_day_epochs: Option<u64>,

    /// Relative TTL of interchain queries.
    pub query_ttl_nanos: u64,

    /// Delegation txs per zone per stride epoch.
    pub max_stake_ica_calls_per_epoch: u64,

    /// Default outer lower bound at registration, relative to 1.0.
    pub safety_min_redemption_rate_threshold_bps: u64,

    /// Default outer upper bound at registration, relative to 1.0.
    pub safety_max_redemption_rate_threshold_bps: u64,

    /// Signers allowed to send control messages.
    pub admins: Vec<String>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            ica_timeout_nanos: ONE_DAY_NANOS,
            ibc_transfer_timeout_nanos: ONE_DAY_NANOS,
            stride_commission_bps: 1_000,
            slash_query_threshold_bps: 100,
            max_slash_bps: 1_000,
            max_delegation_changes_in_progress: 32,
            rebalance_interval_day_epochs: None,
            query_ttl_nanos: ONE_DAY_NANOS,
            max_stake_ica_calls_per_epoch: 100,
            safety_min_redemption_rate_threshold_bps: 9_000,
            safety_max_redemption_rate_threshold_bps: 15_000,
            admins: Vec::new(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), String> {
        if self.ica_timeout_nanos == 0 || self.ibc_transfer_timeout_nanos == 0 {
            return Err("timeouts must be positive".to_string());
        }
        if self.query_ttl_nanos == 0 {
            return Err("query ttl must be positive".to_string());
        }
        if self.stride_commission_bps > BPS_DENOMINATOR {
            return Err(format!(
                "commission {} bps exceeds {BPS_DENOMINATOR}",
                self.stride_commission_bps
            ));
        }
        if self.slash_query_threshold_bps > BPS_DENOMINATOR || self.max_slash_bps > BPS_DENOMINATOR {
            return Err("slash thresholds exceed 100%".to_string());
        }
        if self.safety_min_redemption_rate_threshold_bps > BPS_DENOMINATOR
            || self.safety_max_redemption_rate_threshold_bps < BPS_DENOMINATOR
        {
            return Err("safety thresholds must bracket 1.0".to_string());
        }
        if self.max_stake_ica_calls_per_epoch == 0 {
            return Err("max_stake_ica_calls_per_epoch must be positive".to_string());
        }
        if self.rebalance_interval_day_epochs == Some(0) {
            return Err("rebalance interval must be positive".to_string());
        }
        Ok(())
    }

    pub fn is_admin(&self, signer: &str) -> bool {
        self.admins.iter().any(|admin| admin == signer)
    }
}
