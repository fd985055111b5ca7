//! Reward withdrawal and the commission/reinvest sweep.

use super::host_zone::{must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{CallbackArgs, IcaAccountType, MsgResponse, RemoteMsg};
use crate::error::StakeIbcResult;
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::deposit::append_deposit_record;
use lsc_records::{DepositRecord, DepositRecordSource, DepositRecordStatus};
use shared_types::math::bps_of;
use shared_types::{Coin, Int, StakeEvent};
use tracing::{debug, info, warn};

impl StakeIbcKeeper {
    /// Withdraws rewards from every validator holding a delegation.
    pub(super) fn claim_rewards(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), chain_id)?;
        if zone.ica(IcaAccountType::Withdrawal).is_none() {
            debug!(chain_id, "No withdrawal account, reward claim skipped");
            return Ok(());
        }
        let delegator = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        let delegated: Vec<String> = zone
            .validators
            .iter()
            .filter(|validator| !validator.delegation.is_zero())
            .map(|validator| validator.address.clone())
            .collect();
        let max_messages = usize::try_from(zone.max_messages_per_ica_tx).unwrap_or(usize::MAX).max(1);

        for chunk in delegated.chunks(max_messages) {
            let msgs = chunk
                .iter()
                .map(|validator| RemoteMsg::WithdrawReward {
                    delegator: delegator.clone(),
                    validator: validator.clone(),
                })
                .collect();
            self.submit_ica_tx(
                ctx,
                &zone,
                IcaAccountType::Delegation,
                msgs,
                CallbackArgs::Claim {
                    chain_id: chain_id.to_string(),
                },
            )?;
        }
        Ok(())
    }

    pub(super) fn on_claim(&self, ctx: &mut BlockContext<'_>, chain_id: &str, ack: &AckResponse) -> StakeIbcResult<()> {
        if !ack.is_success() {
            warn!(chain_id, outcome = %ack.status, "Reward withdrawal failed");
            return Ok(());
        }
        let mut claimed = Int::zero();
        for bytes in &ack.msg_responses {
            if let MsgResponse::WithdrawReward { amount } = MsgResponse::decode(bytes)? {
                claimed = claimed.checked_add(amount)?;
            }
        }
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        zone.reward_balance = zone.reward_balance.checked_add(claimed)?;
        set_host_zone(ctx.store_mut(), &zone)?;
        info!(chain_id, claimed = %claimed, reward_balance = %zone.reward_balance, "Rewards withdrawn");

        if let Err(err) = ctx.branch(|ctx| self.sweep_rewards(ctx, chain_id)) {
            warn!(chain_id, error = %err, "Reward sweep skipped");
        }
        Ok(())
    }

    /// Sends the commission to the fee account and the rest to the
    /// delegation account. One sweep at a time.
    pub(super) fn sweep_rewards(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        if zone.reward_sweep_in_progress || zone.reward_balance.is_zero() {
            return Ok(());
        }
        let total = zone.reward_balance;
        let fee_amount = bps_of(total, self.params.stride_commission_bps)?;
        let reinvest_amount = total.checked_sub(fee_amount)?;

        let from = Self::ica_address(&zone, IcaAccountType::Withdrawal)?;
        let mut msgs = Vec::with_capacity(2);
        if !reinvest_amount.is_zero() {
            msgs.push(RemoteMsg::BankSend {
                from: from.clone(),
                to: Self::ica_address(&zone, IcaAccountType::Delegation)?,
                amount: Coin::new(reinvest_amount, zone.host_denom.clone()),
            });
        }
        if !fee_amount.is_zero() {
            msgs.push(RemoteMsg::BankSend {
                from,
                to: Self::ica_address(&zone, IcaAccountType::Fee)?,
                amount: Coin::new(fee_amount, zone.host_denom.clone()),
            });
        }

        zone.reward_sweep_in_progress = true;
        set_host_zone(ctx.store_mut(), &zone)?;
        self.submit_ica_tx(
            ctx,
            &zone,
            IcaAccountType::Withdrawal,
            msgs,
            CallbackArgs::Reinvest {
                chain_id: chain_id.to_string(),
                reinvest_amount,
                fee_amount,
            },
        )?;
        debug!(chain_id, reinvest = %reinvest_amount, fee = %fee_amount, "Reward sweep submitted");
        Ok(())
    }

    pub(super) fn on_reinvest(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        reinvest_amount: Int,
        fee_amount: Int,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        zone.reward_sweep_in_progress = false;

        if ack.is_success() {
            let swept = reinvest_amount.checked_add(fee_amount)?;
            zone.reward_balance = zone.reward_balance.saturating_sub(swept);
            zone.reward_sweep_generation += 1;
            if !reinvest_amount.is_zero() {
                let epoch = self.current_stride_epoch(ctx.store())?;
                append_deposit_record(
                    ctx.store_mut(),
                    DepositRecord::new(
                        chain_id,
                        zone.host_denom.clone(),
                        reinvest_amount,
                        DepositRecordStatus::DelegationQueue,
                        DepositRecordSource::WithdrawalIca,
                        epoch,
                    ),
                )?;
            }
            info!(chain_id, reinvest = %reinvest_amount, fee = %fee_amount, "Rewards reinvested");
            ctx.emit(StakeEvent::RewardsReinvested {
                chain_id: chain_id.to_string(),
                reinvest_amount,
                fee_amount,
            });
        } else {
            warn!(chain_id, outcome = %ack.status, "Reward sweep failed");
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        Ok(())
    }
}
