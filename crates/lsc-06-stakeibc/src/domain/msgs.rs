//! User and control-plane messages accepted by the orchestrator.

use super::host_zone::IcaAccountType;
use super::redemption_rate::RedemptionBounds;
use serde::{Deserialize, Serialize};
use shared_types::Int;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLiquidStake {
    pub creator: String,
    pub amount: Int,
    pub host_denom: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgRedeemStake {
    pub creator: String,
    pub amount: Int,
    pub host_zone_id: String,
    /// Host-chain address receiving the native tokens.
    pub receiver: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClaimUndelegatedTokens {
    pub creator: String,
    pub host_zone_id: String,
    pub epoch: u64,
    /// Redeemer whose record is claimed.
    pub sender: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgLsmLiquidStake {
    pub creator: String,
    pub amount: Int,
    pub lsm_token_ibc_denom: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserMsg {
    LiquidStake(MsgLiquidStake),
    RedeemStake(MsgRedeemStake),
    ClaimUndelegatedTokens(MsgClaimUndelegatedTokens),
    LsmLiquidStake(MsgLsmLiquidStake),
}

impl UserMsg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LiquidStake(_) => "liquid_stake",
            Self::RedeemStake(_) => "redeem_stake",
            Self::ClaimUndelegatedTokens(_) => "claim_undelegated_tokens",
            Self::LsmLiquidStake(_) => "lsm_liquid_stake",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    pub name: String,
    pub address: String,
    pub weight: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostZoneConfig {
    pub chain_id: String,
    pub bech32_prefix: String,
    pub connection_id: String,
    pub transfer_channel_id: String,
    pub host_denom: String,
    pub ibc_denom: String,
    pub unbonding_period_days: u64,
    pub max_messages_per_ica_tx: u64,
    /// Outer bounds default from the safety thresholds when absent.
    pub bounds: Option<RedemptionBounds>,
    pub lsm_liquid_stake_enabled: bool,
    pub validators: Vec<ValidatorConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMsg {
    RegisterHostZone(HostZoneConfig),
    AddValidator {
        chain_id: String,
        validator: ValidatorConfig,
    },
    RemoveValidator {
        chain_id: String,
        address: String,
    },
    ChangeValidatorWeight {
        chain_id: String,
        address: String,
        weight: u64,
    },
    ToggleHalt {
        chain_id: String,
    },
    ResumeHostZone {
        chain_id: String,
    },
    UpdateRedemptionBounds {
        chain_id: String,
        bounds: RedemptionBounds,
    },
    SetLsmEnabled {
        chain_id: String,
        enabled: bool,
    },
    /// Completion of an interchain-account handshake.
    RegisterIcaAccount {
        chain_id: String,
        account_type: IcaAccountType,
        address: String,
        channel_id: String,
    },
}

impl ControlMsg {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterHostZone(_) => "register_host_zone",
            Self::AddValidator { .. } => "add_validator",
            Self::RemoveValidator { .. } => "remove_validator",
            Self::ChangeValidatorWeight { .. } => "change_validator_weight",
            Self::ToggleHalt { .. } => "toggle_halt",
            Self::ResumeHostZone { .. } => "resume_host_zone",
            Self::UpdateRedemptionBounds { .. } => "update_redemption_bounds",
            Self::SetLsmEnabled { .. } => "set_lsm_enabled",
            Self::RegisterIcaAccount { .. } => "register_ica_account",
        }
    }
}
