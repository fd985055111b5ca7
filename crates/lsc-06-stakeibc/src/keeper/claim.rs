use super::host_zone::must_get_host_zone;
use super::StakeIbcKeeper;
use crate::domain::{CallbackArgs, IcaAccountType, MsgClaimUndelegatedTokens, RemoteMsg};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::redemption::{
    get_user_redemption_record, remove_user_redemption_record, set_user_redemption_record,
};
use lsc_records::keeper::unbonding::{get_host_zone_unbonding, set_host_zone_unbonding};
use lsc_records::{user_redemption_record_id, HostZoneUnbondingStatus};
use shared_types::{Coin, StakeEvent};
use tracing::{debug, info, warn};

impl StakeIbcKeeper {
    /// Pays a redemption out of the zone's redemption account on the host.
    ///
    /// The record stays in place, flagged pending, until the transfer is
    /// acknowledged.
    pub fn claim_undelegated_tokens(
        &self,
        ctx: &mut BlockContext<'_>,
        msg: &MsgClaimUndelegatedTokens,
    ) -> StakeIbcResult<u64> {
        ctx.branch(|ctx| self.apply_claim(ctx, msg))
    }

    fn apply_claim(&self, ctx: &mut BlockContext<'_>, msg: &MsgClaimUndelegatedTokens) -> StakeIbcResult<u64> {
        let id = user_redemption_record_id(msg.epoch, &msg.host_zone_id, &msg.sender);
        let mut record = get_user_redemption_record(ctx.store(), &id)?
            .ok_or_else(|| StakeIbcError::InvalidRedemptionRecord(format!("no redemption record {id}")))?;
        let zone = must_get_host_zone(ctx.store(), &msg.host_zone_id)?;
        if zone.halted {
            return Err(StakeIbcError::HostZoneHalted(zone.chain_id));
        }

        let unbonding = get_host_zone_unbonding(ctx.store(), msg.epoch, &msg.host_zone_id)?;
        if !unbonding.status.is_claimable_phase() {
            return Err(StakeIbcError::InvalidRedemptionRecord(format!(
                "{id} is not claimable while its unbonding is {}",
                unbonding.status.as_str()
            )));
        }
        if record.claim_is_pending {
            return Err(StakeIbcError::InvalidRedemptionRecord(format!(
                "claim for {id} is already pending"
            )));
        }
        if record.native_token_amount.is_zero() {
            return Err(StakeIbcError::InvalidRedemptionRecord(format!("{id} has nothing to claim")));
        }

        record.claim_is_pending = true;
        set_user_redemption_record(ctx.store_mut(), &record)?;

        let from = Self::ica_address(&zone, IcaAccountType::Redemption)?;
        let send = RemoteMsg::BankSend {
            from,
            to: record.receiver.clone(),
            amount: Coin::new(record.native_token_amount, zone.host_denom.clone()),
        };
        let sequence = self.submit_ica_tx(
            ctx,
            &zone,
            IcaAccountType::Redemption,
            vec![send],
            CallbackArgs::ClaimUndelegation {
                chain_id: zone.chain_id.clone(),
                user_redemption_record_id: id.clone(),
                epoch: msg.epoch,
            },
        )?;

        info!(chain_id = %zone.chain_id, record_id = %id, amount = %record.native_token_amount, "Claim submitted");
        ctx.emit(StakeEvent::ClaimSubmitted {
            chain_id: zone.chain_id,
            redemption_id: id,
            native_amount: record.native_token_amount,
        });
        Ok(sequence)
    }

    pub(super) fn on_claim_undelegation(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        record_id: &str,
        epoch: u64,
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let Some(mut record) = get_user_redemption_record(ctx.store(), record_id)? else {
            warn!(chain_id, record_id, "Claim resolved for a missing redemption record");
            return Ok(());
        };

        if !ack.is_success() {
            record.claim_is_pending = false;
            set_user_redemption_record(ctx.store_mut(), &record)?;
            warn!(chain_id, record_id, outcome = %ack.status, "Claim failed, retry allowed");
            ctx.emit(StakeEvent::ClaimFailed {
                chain_id: chain_id.to_string(),
                redemption_id: record_id.to_string(),
            });
            return Ok(());
        }

        remove_user_redemption_record(ctx.store_mut(), record_id)?;
        let mut unbonding = get_host_zone_unbonding(ctx.store(), epoch, chain_id)?;
        unbonding.remove_redemption_id(record_id);
        // Only the exit transfer makes an unbonding CLAIMABLE.
        if unbonding.user_redemption_records.is_empty() && unbonding.status != HostZoneUnbondingStatus::Claimable {
            debug!(
                chain_id,
                epoch,
                status = unbonding.status.as_str(),
                "All claims paid ahead of the exit transfer"
            );
        }
        set_host_zone_unbonding(ctx.store_mut(), epoch, unbonding)?;

        info!(chain_id, record_id, amount = %record.native_token_amount, "Claim completed");
        ctx.emit(StakeEvent::ClaimCompleted {
            chain_id: chain_id.to_string(),
            redemption_id: record_id.to_string(),
            native_amount: record.native_token_amount,
        });
        Ok(())
    }
}
