//! Liquid staking of tokenized delegator shares.
//!
//! ```text
//! LsmLiquidStake ─► TRANSFER_QUEUE ─► TRANSFER_IN_PROGRESS ─► DETOKENIZATION_QUEUE
//!                        ▲                 │ fail                    │
//!                        └─────────────────┘          DETOKENIZATION_IN_PROGRESS ─► delegation
//! ```

use super::host_zone::{ensure_accepting_user_actions, host_zone_by_transfer_channel, must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{CallbackArgs, IcaAccountType, MsgLsmLiquidStake, RemoteMsg, TransferPacket};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::lsm::{
    get_lsm_deposit, lsm_deposits_for_zone, must_get_lsm_deposit, remove_lsm_deposit, set_lsm_deposit,
};
use lsc_records::{LsmDepositStatus, LsmTokenDeposit};
use shared_types::math::{div_floor, mul_floor};
use shared_types::{Coin, Int, StakeEvent};
use tracing::{info, warn};

impl StakeIbcKeeper {
    /// Escrows LSM share tokens and mints stTokens for their native value.
    pub fn lsm_liquid_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgLsmLiquidStake) -> StakeIbcResult<Int> {
        ctx.branch(|ctx| self.apply_lsm_liquid_stake(ctx, msg))
    }

    fn apply_lsm_liquid_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgLsmLiquidStake) -> StakeIbcResult<Int> {
        if msg.amount.is_zero() {
            return Err(StakeIbcError::ZeroAmount);
        }
        let trace = self
            .bank
            .denom_trace(ctx.store(), &msg.lsm_token_ibc_denom)?
            .ok_or_else(|| StakeIbcError::InvalidLsmToken(format!("no denom trace for {}", msg.lsm_token_ibc_denom)))?;
        let channel_id = trace
            .channel_id()
            .ok_or_else(|| StakeIbcError::InvalidLsmToken(format!("{} is not a single-hop transfer", trace.path)))?;
        let zone = host_zone_by_transfer_channel(ctx.store(), channel_id)?
            .ok_or_else(|| StakeIbcError::HostZoneNotFound(format!("no zone on {channel_id}")))?;
        if !zone.lsm_liquid_stake_enabled {
            return Err(StakeIbcError::InvalidLsmToken(format!(
                "LSM liquid stakes are disabled for {}",
                zone.chain_id
            )));
        }

        let (validator_address, record_number) = trace
            .base_denom
            .split_once('/')
            .ok_or_else(|| StakeIbcError::InvalidLsmToken(format!("{} is not a share denom", trace.base_denom)))?;
        if record_number.parse::<u64>().is_err() {
            return Err(StakeIbcError::InvalidLsmToken(format!(
                "{} has no tokenization record number",
                trace.base_denom
            )));
        }
        let validator = zone.validator(validator_address).ok_or_else(|| {
            StakeIbcError::InvalidLsmToken(format!("{validator_address} is not in the {} set", zone.chain_id))
        })?;
        if validator.slash_query_in_progress {
            return Err(StakeIbcError::InvalidLsmToken(format!(
                "exchange rate of {validator_address} is being refreshed"
            )));
        }
        ensure_accepting_user_actions(&zone)?;

        let available = self.bank.balance(ctx.store(), &msg.creator, &msg.lsm_token_ibc_denom)?;
        if available < msg.amount {
            return Err(StakeIbcError::InsufficientBalance {
                address: msg.creator.clone(),
                denom: msg.lsm_token_ibc_denom.clone(),
                required: msg.amount,
                available,
            });
        }
        let native_value = mul_floor(msg.amount, validator.shares_to_tokens_rate)?;
        let st_amount = div_floor(native_value, zone.redemption_rate)?;
        if st_amount.is_zero() {
            return Err(StakeIbcError::InsufficientLiquidStake {
                amount: msg.amount,
                rate: zone.redemption_rate,
            });
        }
        if get_lsm_deposit(ctx.store(), &zone.chain_id, &trace.base_denom)?.is_some() {
            return Err(StakeIbcError::InvalidLsmToken(format!(
                "a deposit of {} is already pending",
                trace.base_denom
            )));
        }

        self.bank.send(
            ctx.store_mut(),
            &msg.creator,
            &zone.deposit_address,
            &Coin::new(msg.amount, msg.lsm_token_ibc_denom.clone()),
        )?;
        let st_token = Coin::new(st_amount, zone.derivative_denom.clone());
        self.bank.mint(ctx.store_mut(), &msg.creator, &st_token)?;
        set_lsm_deposit(
            ctx.store_mut(),
            &LsmTokenDeposit {
                chain_id: zone.chain_id.clone(),
                denom: trace.base_denom.clone(),
                ibc_denom: msg.lsm_token_ibc_denom.clone(),
                staker_address: msg.creator.clone(),
                validator_address: validator_address.to_string(),
                amount: msg.amount,
                st_token,
                status: LsmDepositStatus::TransferQueue,
            },
        )?;

        info!(
            chain_id = %zone.chain_id,
            staker = %msg.creator,
            validator = validator_address,
            shares = %msg.amount,
            st_amount = %st_amount,
            "LSM liquid stake"
        );
        ctx.emit(StakeEvent::LsmLiquidStake {
            chain_id: zone.chain_id.clone(),
            staker: msg.creator.clone(),
            validator: validator_address.to_string(),
            lsm_denom: trace.base_denom.clone(),
            shares: msg.amount,
            st_amount,
        });
        Ok(st_amount)
    }

    pub(super) fn transfer_lsm_deposits(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        for deposit in lsm_deposits_for_zone(ctx.store(), chain_id)? {
            if deposit.status != LsmDepositStatus::TransferQueue {
                continue;
            }
            let denom = deposit.denom.clone();
            if let Err(err) = ctx.branch(|ctx| self.transfer_lsm_deposit(ctx, deposit)) {
                warn!(chain_id, denom = %denom, error = %err, "LSM transfer skipped");
            }
        }
        Ok(())
    }

    fn transfer_lsm_deposit(&self, ctx: &mut BlockContext<'_>, mut deposit: LsmTokenDeposit) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), &deposit.chain_id)?;
        let receiver = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        let escrow = self.transfer_escrow_address(ctx)?;

        deposit.transition(LsmDepositStatus::TransferInProgress)?;
        set_lsm_deposit(ctx.store_mut(), &deposit)?;
        self.bank.send(
            ctx.store_mut(),
            &zone.deposit_address,
            &escrow,
            &Coin::new(deposit.amount, deposit.ibc_denom.clone()),
        )?;
        self.submit_transfer(
            ctx,
            &zone,
            TransferPacket {
                denom: deposit.ibc_denom.clone(),
                amount: deposit.amount,
                sender: escrow,
                receiver,
            },
            CallbackArgs::LsmTransfer {
                chain_id: deposit.chain_id.clone(),
                denom: deposit.denom.clone(),
            },
        )?;
        Ok(())
    }

    pub(super) fn on_lsm_transfer(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        denom: &str,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), chain_id)?;
        let mut deposit = must_get_lsm_deposit(ctx.store(), chain_id, denom)?;
        let escrow = self.transfer_escrow_address(ctx)?;
        let coin = Coin::new(deposit.amount, deposit.ibc_denom.clone());

        if ack.is_success() {
            self.bank.burn(ctx.store_mut(), &escrow, &coin)?;
            deposit.transition(LsmDepositStatus::DetokenizationQueue)?;
        } else {
            self.bank.send(ctx.store_mut(), &escrow, &zone.deposit_address, &coin)?;
            deposit.transition(LsmDepositStatus::TransferQueue)?;
            warn!(chain_id, denom, outcome = %ack.status, "LSM transfer reverted");
        }
        set_lsm_deposit(ctx.store_mut(), &deposit)?;
        Ok(())
    }

    pub(super) fn detokenize_lsm_deposits(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        for deposit in lsm_deposits_for_zone(ctx.store(), chain_id)? {
            if deposit.status != LsmDepositStatus::DetokenizationQueue {
                continue;
            }
            let denom = deposit.denom.clone();
            if let Err(err) = ctx.branch(|ctx| self.detokenize(ctx, deposit)) {
                warn!(chain_id, denom = %denom, error = %err, "Detokenization skipped");
            }
        }
        Ok(())
    }

    fn detokenize(&self, ctx: &mut BlockContext<'_>, mut deposit: LsmTokenDeposit) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), &deposit.chain_id)?;
        let delegator = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        zone.validator_mut(&deposit.validator_address)
            .ok_or_else(|| {
                StakeIbcError::InvalidLsmToken(format!("{} left the validator set", deposit.validator_address))
            })?
            .begin_change();
        set_host_zone(ctx.store_mut(), &zone)?;

        deposit.transition(LsmDepositStatus::DetokenizationInProgress)?;
        set_lsm_deposit(ctx.store_mut(), &deposit)?;
        self.submit_ica_tx(
            ctx,
            &zone,
            IcaAccountType::Delegation,
            vec![RemoteMsg::RedeemTokensForShares {
                delegator,
                amount: Coin::new(deposit.amount, deposit.denom.clone()),
            }],
            CallbackArgs::Detokenize {
                chain_id: deposit.chain_id.clone(),
                denom: deposit.denom.clone(),
            },
        )?;
        Ok(())
    }

    pub(super) fn on_detokenize(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        denom: &str,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let mut deposit = must_get_lsm_deposit(ctx.store(), chain_id, denom)?;
        let validator = zone
            .validator_mut(&deposit.validator_address)
            .ok_or_else(|| StakeIbcError::Internal(format!("detokenized into unknown validator {}", deposit.validator_address)))?;
        if !validator.end_change() {
            return Err(StakeIbcError::Internal(format!(
                "no change in flight for {}",
                deposit.validator_address
            )));
        }

        if ack.is_success() {
            let native = mul_floor(deposit.amount, validator.shares_to_tokens_rate)?;
            validator.delegation = validator.delegation.checked_add(native)?;
            validator.slash_query_progress_tracker = validator.slash_query_progress_tracker.checked_add(native)?;
            zone.total_delegations = zone.total_delegations.checked_add(native)?;
            remove_lsm_deposit(ctx.store_mut(), chain_id, denom)?;
            info!(chain_id, denom, native = %native, "LSM shares detokenized");
            ctx.emit(StakeEvent::DelegationApplied {
                chain_id: chain_id.to_string(),
                validator: deposit.validator_address.clone(),
                amount: native,
            });
        } else {
            deposit.transition(LsmDepositStatus::DetokenizationQueue)?;
            set_lsm_deposit(ctx.store_mut(), &deposit)?;
            warn!(chain_id, denom, outcome = %ack.status, "Detokenization reverted");
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        Ok(())
    }
}
