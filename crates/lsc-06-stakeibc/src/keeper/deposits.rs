//! Deposit pipeline: local escrow → host delegation account → validators.

use super::host_zone::{must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{allocate_delegation, CallbackArgs, IcaAccountType, RemoteMsg, TransferPacket, ValidatorAmount};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::deposit::{
    append_deposit_record, deposit_records_for_zone, must_get_deposit_record, remove_deposit_record,
    set_deposit_record,
};
use lsc_records::{DepositRecord, DepositRecordStatus};
use shared_types::math::checked_sum;
use shared_types::{Coin, StakeEvent};
use tracing::{debug, info, warn};

impl StakeIbcKeeper {
    /// Moves every TRANSFER_QUEUE record of the zone to the host.
    pub(super) fn transfer_deposits(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let epoch = self.current_stride_epoch(ctx.store())?;
        let queued: Vec<DepositRecord> = deposit_records_for_zone(ctx.store(), chain_id)?
            .into_iter()
            .filter(|record| record.status == DepositRecordStatus::TransferQueue)
            .collect();

        for record in queued {
            if record.amount.is_zero() {
                if record.deposit_epoch_number < epoch {
                    remove_deposit_record(ctx.store_mut(), record.id)?;
                    debug!(chain_id, record_id = record.id, "Empty deposit record removed");
                }
                continue;
            }
            let record_id = record.id;
            if let Err(err) = ctx.branch(|ctx| self.transfer_deposit(ctx, chain_id, record)) {
                warn!(chain_id, record_id, error = %err, "Deposit transfer skipped");
            }
        }
        Ok(())
    }

    fn transfer_deposit(&self, ctx: &mut BlockContext<'_>, chain_id: &str, mut record: DepositRecord) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), chain_id)?;
        let receiver = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        let escrow = self.transfer_escrow_address(ctx)?;

        record.transition(DepositRecordStatus::TransferInProgress)?;
        set_deposit_record(ctx.store_mut(), &record)?;
        self.bank.send(
            ctx.store_mut(),
            &zone.deposit_address,
            &escrow,
            &Coin::new(record.amount, zone.ibc_denom.clone()),
        )?;
        self.submit_transfer(
            ctx,
            &zone,
            TransferPacket {
                denom: zone.ibc_denom.clone(),
                amount: record.amount,
                sender: escrow,
                receiver,
            },
            CallbackArgs::NativeTransfer {
                chain_id: chain_id.to_string(),
                deposit_record_id: record.id,
                amount: record.amount,
            },
        )?;
        Ok(())
    }

    pub(super) fn on_native_transfer(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        record_id: u64,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let zone = must_get_host_zone(ctx.store(), chain_id)?;
        let mut record = must_get_deposit_record(ctx.store(), record_id)?;
        let escrow = self.transfer_escrow_address(ctx)?;
        let coin = Coin::new(record.amount, zone.ibc_denom.clone());

        if ack.is_success() {
            self.bank.burn(ctx.store_mut(), &escrow, &coin)?;
            record.transition(DepositRecordStatus::DelegationQueue)?;
            info!(chain_id, record_id, amount = %record.amount, "Deposit arrived on host");
        } else {
            self.bank.send(ctx.store_mut(), &escrow, &zone.deposit_address, &coin)?;
            record.transition(DepositRecordStatus::TransferQueue)?;
            warn!(chain_id, record_id, outcome = %ack.status, "Deposit transfer reverted");
        }
        set_deposit_record(ctx.store_mut(), &record)?;
        Ok(())
    }

    /// Delegates DELEGATION_QUEUE records, at most
    /// `max_stake_ica_calls_per_epoch` txs per zone.
    pub(super) fn delegate_deposits(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let queued: Vec<DepositRecord> = deposit_records_for_zone(ctx.store(), chain_id)?
            .into_iter()
            .filter(|record| record.status == DepositRecordStatus::DelegationQueue)
            .collect();

        let mut calls = 0u64;
        for record in queued {
            if calls >= self.params.max_stake_ica_calls_per_epoch {
                info!(chain_id, calls, "Delegation call cap reached for this epoch");
                break;
            }
            let record_id = record.id;
            match ctx.branch(|ctx| self.delegate_deposit(ctx, chain_id, record)) {
                Ok(()) => calls += 1,
                Err(err) => warn!(chain_id, record_id, error = %err, "Delegation skipped"),
            }
        }
        Ok(())
    }

    fn delegate_deposit(&self, ctx: &mut BlockContext<'_>, chain_id: &str, mut record: DepositRecord) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let delegator = Self::ica_address(&zone, IcaAccountType::Delegation)?;
        let max_messages = usize::try_from(zone.max_messages_per_ica_tx).unwrap_or(usize::MAX).max(1);

        let mut splits = allocate_delegation(
            record.amount,
            &zone.validators,
            self.params.max_delegation_changes_in_progress,
        )?;
        if splits.len() > max_messages {
            splits.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.validator.cmp(&b.validator)));
            let deferred = splits.split_off(max_messages);
            let remainder = checked_sum(deferred.iter().map(|split| split.amount))?;
            record.amount = record.amount.checked_sub(remainder)?;
            let split_record = append_deposit_record(
                ctx.store_mut(),
                DepositRecord::new(
                    chain_id,
                    record.denom.clone(),
                    remainder,
                    DepositRecordStatus::DelegationQueue,
                    record.source,
                    record.deposit_epoch_number,
                ),
            )?;
            debug!(chain_id, record_id = record.id, split_id = split_record.id, remainder = %remainder, "Deposit split");
        }

        for split in &splits {
            zone.validator_mut(&split.validator)
                .ok_or_else(|| StakeIbcError::Internal(format!("allocation to unknown validator {}", split.validator)))?
                .begin_change();
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        record.transition(DepositRecordStatus::DelegationInProgress)?;
        set_deposit_record(ctx.store_mut(), &record)?;

        let msgs = splits
            .iter()
            .map(|split| RemoteMsg::Delegate {
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
            CallbackArgs::Delegate {
                chain_id: chain_id.to_string(),
                deposit_record_id: record.id,
                splits,
            },
        )?;
        Ok(())
    }

    pub(super) fn on_delegate(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        record_id: u64,
        splits: &[ValidatorAmount],
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let mut record = must_get_deposit_record(ctx.store(), record_id)?;
        for split in splits {
            let validator = zone
                .validator_mut(&split.validator)
                .ok_or_else(|| StakeIbcError::Internal(format!("delegation to unknown validator {}", split.validator)))?;
            if !validator.end_change() {
                return Err(StakeIbcError::Internal(format!(
                    "no change in flight for {}",
                    split.validator
                )));
            }
        }

        if !ack.is_success() {
            set_host_zone(ctx.store_mut(), &zone)?;
            record.transition(DepositRecordStatus::DelegationQueue)?;
            set_deposit_record(ctx.store_mut(), &record)?;
            warn!(chain_id, record_id, outcome = %ack.status, "Delegation reverted");
            return Ok(());
        }

        for split in splits {
            let validator = zone
                .validator_mut(&split.validator)
                .ok_or_else(|| StakeIbcError::Internal(format!("delegation to unknown validator {}", split.validator)))?;
            validator.delegation = validator.delegation.checked_add(split.amount)?;
            validator.slash_query_progress_tracker =
                validator.slash_query_progress_tracker.checked_add(split.amount)?;
            zone.total_delegations = zone.total_delegations.checked_add(split.amount)?;
            ctx.emit(StakeEvent::DelegationApplied {
                chain_id: chain_id.to_string(),
                validator: split.validator.clone(),
                amount: split.amount,
            });
        }
        super::icqueries::reset_slash_checkpoints(&mut zone, self.params.slash_query_threshold_bps)?;
        remove_deposit_record(ctx.store_mut(), record_id)?;

        for split in splits {
            let due = zone
                .validator(&split.validator)
                .is_some_and(|validator| validator.needs_slash_query());
            if due {
                self.submit_exchange_rate_query(ctx, &mut zone, &split.validator)?;
            }
        }
        set_host_zone(ctx.store_mut(), &zone)?;

        info!(chain_id, record_id, validators = splits.len(), total = %zone.total_delegations, "Delegation applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MsgLiquidStake, PacketPayload};
    use crate::keeper::test_utils::{Harness, GAIA};
    use lsc_records::keeper::deposit::get_deposit_record;
    use crate::ports::Bank;
    use lsc_records::DepositRecordSource;
    use shared_types::Int;

    fn staked(amount: u128) -> Harness {
        let mut harness = Harness::new();
        let user = Harness::user(1);
        harness.fund(&user, amount, "ibc/uatom");
        let keeper = harness.keeper();
        keeper
            .liquid_stake(
                &mut harness.ctx(),
                &MsgLiquidStake {
                    creator: user,
                    amount: Int::new(amount),
                    host_denom: "uatom".into(),
                },
            )
            .unwrap();
        harness
    }

    fn transfer(harness: &mut Harness) {
        let keeper = harness.keeper();
        keeper.transfer_deposits(&mut harness.ctx(), GAIA).unwrap();
    }

    fn delegate(harness: &mut Harness) {
        let keeper = harness.keeper();
        keeper.delegate_deposits(&mut harness.ctx(), GAIA).unwrap();
    }

    #[test]
    fn test_transfer_escrows_and_acks_burn() {
        let mut harness = staked(1_000);
        transfer(&mut harness);
        let zone = harness.zone();
        assert_eq!(harness.balance(&zone.deposit_address, "ibc/uatom"), 0);
        let record = get_deposit_record(&harness.store, 0).unwrap().unwrap();
        assert_eq!(record.status, DepositRecordStatus::TransferInProgress);

        let sent = harness.pending().remove(0);
        assert!(matches!(sent.packet.payload, PacketPayload::Transfer(_)));
        harness.ack_empty(&sent);

        let record = get_deposit_record(&harness.store, 0).unwrap().unwrap();
        assert_eq!(record.status, DepositRecordStatus::DelegationQueue);
        let supply = harness.bank.supply(&harness.store, "ibc/uatom").unwrap();
        assert!(supply.is_zero());
    }

    #[test]
    fn test_transfer_timeout_returns_tokens() {
        let mut harness = staked(1_000);
        transfer(&mut harness);
        let sent = harness.pending().remove(0);
        harness.timeout(&sent);

        let zone = harness.zone();
        assert_eq!(harness.balance(&zone.deposit_address, "ibc/uatom"), 1_000);
        let record = get_deposit_record(&harness.store, 0).unwrap().unwrap();
        assert_eq!(record.status, DepositRecordStatus::TransferQueue);
    }

    #[test]
    fn test_delegate_ack_applies_weighted_split() {
        let mut harness = staked(1_000);
        transfer(&mut harness);
        let sent = harness.pending().remove(0);
        harness.ack_empty(&sent);
        delegate(&mut harness);

        let record = get_deposit_record(&harness.store, 0).unwrap().unwrap();
        assert_eq!(record.status, DepositRecordStatus::DelegationInProgress);
        assert!(harness
            .zone()
            .validators
            .iter()
            .all(|v| v.delegation_changes_in_progress == 1));

        let sent = harness.pending().remove(0);
        harness.ack_empty(&sent);

        let zone = harness.zone();
        let delegations: Vec<u128> = zone.validators.iter().map(|v| v.delegation.u128()).collect();
        assert_eq!(delegations, vec![500, 300, 200]);
        assert_eq!(zone.total_delegations, Int::new(1_000));
        assert!(zone.validators.iter().all(|v| v.delegation_changes_in_progress == 0));
        assert!(get_deposit_record(&harness.store, 0).unwrap().is_none());
        // every validator crossed its 1% checkpoint
        assert!(zone.validators.iter().all(|v| v.slash_query_in_progress));
        assert_eq!(lsc_interchain_query::all_queries(&harness.store).unwrap().len(), 3);
    }

    #[test]
    fn test_delegate_failure_requeues_without_applying() {
        let mut harness = Harness::new();
        let record = append_deposit_record(
            &mut harness.store,
            DepositRecord::new(GAIA, "uatom", Int::new(300), DepositRecordStatus::DelegationQueue, DepositRecordSource::WithdrawalIca, 1),
        )
        .unwrap();
        delegate(&mut harness);
        let sent = harness.pending().remove(0);
        harness.ack_error(&sent);

        let zone = harness.zone();
        assert!(zone.total_delegations.is_zero());
        assert!(zone.validators.iter().all(|v| v.delegation_changes_in_progress == 0));
        let record = get_deposit_record(&harness.store, record.id).unwrap().unwrap();
        assert_eq!(record.status, DepositRecordStatus::DelegationQueue);
    }

    #[test]
    fn test_oversized_allocation_is_split() {
        let mut harness = Harness::new();
        harness.update_zone(|zone| zone.max_messages_per_ica_tx = 2);
        append_deposit_record(
            &mut harness.store,
            DepositRecord::new(GAIA, "uatom", Int::new(1_000), DepositRecordStatus::DelegationQueue, DepositRecordSource::StrideDeposit, 1),
        )
        .unwrap();
        delegate(&mut harness);

        let records = deposit_records_for_zone(&harness.store, GAIA).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amount, Int::new(800));
        assert_eq!(records[0].status, DepositRecordStatus::DelegationInProgress);
        assert_eq!(records[1].amount, Int::new(200));
        assert_eq!(records[1].status, DepositRecordStatus::DelegationQueue);
        match &harness.pending()[0].packet.payload {
            PacketPayload::IcaTx(msgs) => assert_eq!(msgs.len(), 2),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_staking_call_cap() {
        let mut harness = Harness::with_params(crate::config::Params {
            max_stake_ica_calls_per_epoch: 1,
            admins: vec![crate::keeper::test_utils::ADMIN.to_string()],
            ..Default::default()
        });
        for _ in 0..2 {
            append_deposit_record(
                &mut harness.store,
                DepositRecord::new(GAIA, "uatom", Int::new(100), DepositRecordStatus::DelegationQueue, DepositRecordSource::StrideDeposit, 1),
            )
            .unwrap();
        }
        delegate(&mut harness);
        assert_eq!(harness.pending().len(), 1);
    }
}
