//! Host zone and the accounts it owns.

use super::redemption_rate::RedemptionBounds;
use super::validator::Validator;
use serde::{Deserialize, Serialize};
use shared_types::{Dec, Int};

/// Roles of the interchain accounts a zone controls on its host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IcaAccountType {
    Delegation,
    Withdrawal,
    Fee,
    Redemption,
}

impl IcaAccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delegation => "DELEGATION",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Fee => "FEE",
            Self::Redemption => "REDEMPTION",
        }
    }

    /// Controller port owning this account's channel.
    pub fn port_id(&self, chain_id: &str) -> String {
        format!("icacontroller-{chain_id}.{}", self.as_str())
    }
}

/// A remote account, usable once its channel is open and address known.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcaAccount {
    pub address: String,
    pub port_id: String,
    pub channel_id: String,
}

impl IcaAccount {
    pub fn is_open(&self) -> bool {
        !self.address.is_empty() && !self.channel_id.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostZone {
    pub chain_id: String,
    pub bech32_prefix: String,
    pub connection_id: String,
    pub transfer_channel_id: String,
    pub host_denom: String,
    /// Wrapped host denom on this chain.
    pub ibc_denom: String,
    pub derivative_denom: String,

    /// Local module account receiving liquid-stake deposits.
    pub deposit_address: String,
    /// Local module account escrowing stTokens awaiting burn.
    pub redemption_module_address: String,
    pub delegation_ica: Option<IcaAccount>,
    pub withdrawal_ica: Option<IcaAccount>,
    pub fee_ica: Option<IcaAccount>,
    pub redemption_ica: Option<IcaAccount>,

    pub validators: Vec<Validator>,
    pub total_delegations: Int,

    pub redemption_rate: Dec,
    pub last_redemption_rate: Dec,
    pub min_redemption_rate: Dec,
    pub max_redemption_rate: Dec,
    pub min_inner_redemption_rate: Dec,
    pub max_inner_redemption_rate: Dec,
    /// Rate landed between inner and outer bounds at the last computation.
    pub redemption_rate_frozen: bool,

    /// Rewards sitting on the withdrawal account.
    pub reward_balance: Int,
    pub reward_sweep_in_progress: bool,
    /// Sweeps acknowledged so far. Balance queries carry the value seen at
    /// submission.
    pub reward_sweep_generation: u64,

    pub unbonding_period_days: u64,
    pub max_messages_per_ica_tx: u64,
    pub halted: bool,
    pub lsm_liquid_stake_enabled: bool,
}

impl HostZone {
    pub fn bounds(&self) -> RedemptionBounds {
        RedemptionBounds {
            min_outer: self.min_redemption_rate,
            min_inner: self.min_inner_redemption_rate,
            max_inner: self.max_inner_redemption_rate,
            max_outer: self.max_redemption_rate,
        }
    }

    pub fn set_bounds(&mut self, bounds: &RedemptionBounds) {
        self.min_redemption_rate = bounds.min_outer;
        self.min_inner_redemption_rate = bounds.min_inner;
        self.max_inner_redemption_rate = bounds.max_inner;
        self.max_redemption_rate = bounds.max_outer;
    }

    pub fn ica(&self, account: IcaAccountType) -> Option<&IcaAccount> {
        let slot = match account {
            IcaAccountType::Delegation => &self.delegation_ica,
            IcaAccountType::Withdrawal => &self.withdrawal_ica,
            IcaAccountType::Fee => &self.fee_ica,
            IcaAccountType::Redemption => &self.redemption_ica,
        };
        slot.as_ref().filter(|ica| ica.is_open())
    }

    pub fn set_ica(&mut self, account: IcaAccountType, ica: IcaAccount) {
        let slot = match account {
            IcaAccountType::Delegation => &mut self.delegation_ica,
            IcaAccountType::Withdrawal => &mut self.withdrawal_ica,
            IcaAccountType::Fee => &mut self.fee_ica,
            IcaAccountType::Redemption => &mut self.redemption_ica,
        };
        *slot = Some(ica);
    }

    pub fn validator(&self, address: &str) -> Option<&Validator> {
        self.validators.iter().find(|v| v.address == address)
    }

    pub fn validator_mut(&mut self, address: &str) -> Option<&mut Validator> {
        self.validators.iter_mut().find(|v| v.address == address)
    }

    /// `Σ validator.delegation`, `None` on overflow.
    pub fn sum_validator_delegations(&self) -> Option<Int> {
        self.validators
            .iter()
            .try_fold(Int::zero(), |acc, v| acc.checked_add(v.delegation).ok())
    }

    /// `total_delegations == Σ validator.delegation`.
    pub fn delegations_balanced(&self) -> bool {
        self.sum_validator_delegations() == Some(self.total_delegations)
    }
}
