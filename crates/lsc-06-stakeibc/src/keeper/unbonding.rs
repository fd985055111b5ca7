//! Unbonding pipeline: batched undelegation on the stride tick, exit
//! transfer to the redemption account on the day tick.

use super::host_zone::{must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{allocate_undelegation, CallbackArgs, IcaAccountType, MsgResponse, RemoteMsg, ValidatorAmount};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::redemption::{must_get_user_redemption_record, set_user_redemption_record};
use lsc_records::keeper::unbonding::{
    get_epoch_unbonding_record, get_host_zone_unbonding, host_zone_unbondings_with_status,
    remove_host_zone_unbonding, set_host_zone_unbonding, set_host_zone_unbonding_status,
};
use lsc_records::{HostZoneUnbonding, HostZoneUnbondingStatus};
use shared_types::math::{checked_sum, mul_floor, mul_ratio_floor};
use shared_types::{Coin, StakeEvent};
use tracing::{debug, info, warn};

impl StakeIbcKeeper {
    /// Undelegates every UNBONDING_QUEUE entry of the zone.
    pub(super) fn undelegate_unbondings(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let current = self.current_stride_epoch(ctx.store())?;
        let queued = host_zone_unbondings_with_status(ctx.store(), chain_id, HostZoneUnbondingStatus::UnbondingQueue)?;
        for (epoch, unbonding) in queued {
            if unbonding.st_token_amount.is_zero() {
                if epoch < current && unbonding.user_redemption_records.is_empty() {
                    remove_host_zone_unbonding(ctx.store_mut(), epoch, chain_id)?;
                    debug!(chain_id, epoch, "Empty unbonding removed");
                }
                continue;
            }
            if let Err(err) = ctx.branch(|ctx| self.undelegate_unbonding(ctx, chain_id, epoch, unbonding)) {
                warn!(chain_id, epoch, error = %err, "Undelegation skipped");
            }
        }
        Ok(())
    }

    fn undelegate_unbonding(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        epoch: u64,
        mut unbonding: HostZoneUnbonding,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let delegator = Self::ica_address(&zone, IcaAccountType::Delegation)?;

        // a fresh batch; a retried one keeps what is left of its first plan
        if unbonding.st_tokens_to_burn.is_zero() && unbonding.native_tokens_to_unbond.is_zero() {
            unbonding.st_tokens_to_burn = unbonding.st_token_amount;
            unbonding.native_tokens_to_unbond = mul_floor(unbonding.st_token_amount, zone.redemption_rate)?;
        }
        if unbonding.native_tokens_to_unbond.is_zero() {
            return Err(StakeIbcError::InvalidRedemptionRecord(format!(
                "unbonding for {chain_id} in epoch {epoch} resolves to zero native tokens"
            )));
        }

        let splits = allocate_undelegation(unbonding.native_tokens_to_unbond, &zone.validators)?;
        let max_messages = usize::try_from(zone.max_messages_per_ica_tx).unwrap_or(usize::MAX).max(1);
        let chunks: Vec<Vec<ValidatorAmount>> = splits.chunks(max_messages).map(<[_]>::to_vec).collect();

        for split in &splits {
            zone.validator_mut(&split.validator)
                .ok_or_else(|| StakeIbcError::Internal(format!("allocation to unknown validator {}", split.validator)))?
                .begin_change();
        }
        set_host_zone(ctx.store_mut(), &zone)?;

        unbonding.undelegation_txs_in_progress =
            u32::try_from(chunks.len()).map_err(|e| StakeIbcError::Internal(e.to_string()))?;
        unbonding.transition(HostZoneUnbondingStatus::UnbondingInProgress)?;
        set_host_zone_unbonding(ctx.store_mut(), epoch, unbonding.clone())?;

        let last = chunks.len().saturating_sub(1);
        let mut st_left = unbonding.st_tokens_to_burn;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let chunk_native = checked_sum(chunk.iter().map(|split| split.amount))?;
            let chunk_st = if index == last {
                st_left
            } else {
                mul_ratio_floor(
                    unbonding.st_tokens_to_burn,
                    chunk_native,
                    unbonding.native_tokens_to_unbond,
                )?
            };
            st_left = st_left.checked_sub(chunk_st)?;

            let msgs = chunk
                .iter()
                .map(|split| RemoteMsg::Undelegate {
                    delegator: delegator.clone(),
                    validator: split.validator.clone(),
                    amount: Coin::new(split.amount, zone.host_denom.clone()),
                })
                .collect();
            self.submit_ica_tx(
                ctx,
                &zone,
                IcaAccountType::Delegation,
                msgs,
                CallbackArgs::Undelegate {
                    chain_id: chain_id.to_string(),
                    epoch,
                    splits: chunk,
                    st_tokens_to_burn: chunk_st,
                },
            )?;
        }

        info!(
            chain_id,
            epoch,
            native_amount = %unbonding.native_tokens_to_unbond,
            txs = unbonding.undelegation_txs_in_progress,
            "Undelegation submitted"
        );
        Ok(())
    }

    pub(super) fn on_undelegate(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        epoch: u64,
        splits: &[ValidatorAmount],
        st_tokens_to_burn: shared_types::Int,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let mut unbonding = get_host_zone_unbonding(ctx.store(), epoch, chain_id)?;
        for split in splits {
            let validator = zone
                .validator_mut(&split.validator)
                .ok_or_else(|| StakeIbcError::Internal(format!("undelegation from unknown validator {}", split.validator)))?;
            if !validator.end_change() {
                return Err(StakeIbcError::Internal(format!(
                    "no change in flight for {}",
                    split.validator
                )));
            }
        }

        if ack.is_success() {
            let chunk_native = checked_sum(splits.iter().map(|split| split.amount))?;
            for split in splits {
                let validator = zone
                    .validator_mut(&split.validator)
                    .ok_or_else(|| StakeIbcError::Internal(format!("undelegation from unknown validator {}", split.validator)))?;
                validator.delegation = validator.delegation.checked_sub(split.amount).map_err(|_| {
                    StakeIbcError::Internal(format!("undelegation exceeds delegation of {}", split.validator))
                })?;
                validator.slash_query_progress_tracker =
                    validator.slash_query_progress_tracker.checked_add(split.amount)?;
            }
            zone.total_delegations = zone
                .total_delegations
                .checked_sub(chunk_native)
                .map_err(|_| StakeIbcError::Internal(format!("undelegation exceeds total delegations of {chain_id}")))?;

            unbonding.native_token_amount = unbonding.native_token_amount.checked_add(chunk_native)?;
            unbonding.native_tokens_to_unbond = unbonding
                .native_tokens_to_unbond
                .checked_sub(chunk_native)
                .map_err(|_| StakeIbcError::Internal(format!("over-undelegated epoch {epoch} of {chain_id}")))?;
            unbonding.st_tokens_to_burn = unbonding
                .st_tokens_to_burn
                .checked_sub(st_tokens_to_burn)
                .map_err(|_| StakeIbcError::Internal(format!("over-burned epoch {epoch} of {chain_id}")))?;
            if !st_tokens_to_burn.is_zero() {
                self.bank.burn(
                    ctx.store_mut(),
                    &zone.redemption_module_address,
                    &Coin::new(st_tokens_to_burn, zone.derivative_denom.clone()),
                )?;
            }

            for bytes in &ack.msg_responses {
                if let MsgResponse::Undelegate { completion_time_secs } = MsgResponse::decode(bytes)? {
                    unbonding.unbonding_time = unbonding.unbonding_time.max(completion_time_secs);
                }
            }
            ctx.emit(StakeEvent::UndelegationApplied {
                chain_id: chain_id.to_string(),
                epoch,
                native_amount: chunk_native,
                st_burned: st_tokens_to_burn,
            });
        } else {
            warn!(chain_id, epoch, outcome = %ack.status, "Undelegation chunk failed");
        }

        unbonding.undelegation_txs_in_progress = unbonding
            .undelegation_txs_in_progress
            .checked_sub(1)
            .ok_or_else(|| StakeIbcError::Internal(format!("no undelegation in flight for epoch {epoch}")))?;
        if unbonding.undelegation_txs_in_progress == 0 {
            if unbonding.native_tokens_to_unbond.is_zero() {
                unbonding.transition(HostZoneUnbondingStatus::ExitTransferQueue)?;
                self.assign_native_amounts(ctx, &unbonding)?;
                info!(chain_id, epoch, native_amount = %unbonding.native_token_amount, "Unbonding started");
            } else {
                unbonding.transition(HostZoneUnbondingStatus::UnbondingQueue)?;
                warn!(chain_id, epoch, remaining = %unbonding.native_tokens_to_unbond, "Unbonding requeued");
            }
        }

        set_host_zone(ctx.store_mut(), &zone)?;
        set_host_zone_unbonding(ctx.store_mut(), epoch, unbonding)?;
        Ok(())
    }

    /// Splits the unbonded total across the batch's users by stToken share.
    /// Flooring leaves dust on the redemption account.
    fn assign_native_amounts(&self, ctx: &mut BlockContext<'_>, unbonding: &HostZoneUnbonding) -> StakeIbcResult<()> {
        let records = unbonding
            .user_redemption_records
            .iter()
            .map(|id| must_get_user_redemption_record(ctx.store(), id))
            .collect::<Result<Vec<_>, _>>()?;
        let total_st = checked_sum(records.iter().map(|record| record.st_token_amount))?;
        if total_st.is_zero() {
            return Ok(());
        }
        for mut record in records {
            record.native_token_amount =
                mul_ratio_floor(unbonding.native_token_amount, record.st_token_amount, total_st)?;
            set_user_redemption_record(ctx.store_mut(), &record)?;
        }
        Ok(())
    }

    /// Day tick: moves matured unbondings to the redemption account in one send.
    pub(super) fn transfer_exited_unbondings(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let now = ctx.block_time_secs();
        let ready: Vec<(u64, HostZoneUnbonding)> =
            host_zone_unbondings_with_status(ctx.store(), chain_id, HostZoneUnbondingStatus::ExitTransferQueue)?
                .into_iter()
                .filter(|(_, unbonding)| unbonding.unbonding_time <= now)
                .collect();
        if ready.is_empty() {
            return Ok(());
        }
        ctx.branch(|ctx| self.exit_transfer(ctx, chain_id, ready))
    }

    fn exit_transfer(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        ready: Vec<(u64, HostZoneUnbonding)>,
    ) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), chain_id)?;
        let total = checked_sum(ready.iter().map(|(_, unbonding)| unbonding.native_token_amount))?;
        let epochs: Vec<u64> = ready.iter().map(|(epoch, _)| *epoch).collect();

        if total.is_zero() {
            set_host_zone_unbonding_status(ctx.store_mut(), chain_id, &epochs, HostZoneUnbondingStatus::Claimable)?;
            for epoch in epochs {
                ctx.emit(StakeEvent::UnbondingClaimable {
                    chain_id: chain_id.to_string(),
                    epoch,
                });
            }
            return Ok(());
        }

        let from = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        let to = Self::ica_address(&zone, IcaAccountType::Redemption)?;
        set_host_zone_unbonding_status(
            ctx.store_mut(),
            chain_id,
            &epochs,
            HostZoneUnbondingStatus::ExitTransferInProgress,
        )?;
        self.submit_ica_tx(
            ctx,
            &zone,
            IcaAccountType::Delegation,
            vec![RemoteMsg::BankSend {
                from,
                to,
                amount: Coin::new(total, zone.host_denom.clone()),
            }],
            CallbackArgs::Redemption {
                chain_id: chain_id.to_string(),
                epochs: epochs.clone(),
            },
        )?;
        info!(chain_id, ?epochs, amount = %total, "Exit transfer submitted");
        Ok(())
    }

    pub(super) fn on_redemption(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        epochs: &[u64],
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        for &epoch in epochs {
            let Some(mut unbonding) = get_epoch_unbonding_record(ctx.store(), epoch)?
                .and_then(|record| record.host_zone_unbonding(chain_id).cloned())
            else {
                warn!(chain_id, epoch, "Exit transfer resolved for a pruned unbonding");
                continue;
            };
            if unbonding.status != HostZoneUnbondingStatus::ExitTransferInProgress {
                continue;
            }
            if ack.is_success() {
                unbonding.transition(HostZoneUnbondingStatus::Claimable)?;
                ctx.emit(StakeEvent::UnbondingClaimable {
                    chain_id: chain_id.to_string(),
                    epoch,
                });
            } else {
                unbonding.transition(HostZoneUnbondingStatus::ExitTransferQueue)?;
                warn!(chain_id, epoch, outcome = %ack.status, "Exit transfer reverted");
            }
            set_host_zone_unbonding(ctx.store_mut(), epoch, unbonding)?;
        }
        Ok(())
    }
}
