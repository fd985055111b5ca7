use super::host_zone::{ensure_accepting_user_actions, must_get_host_zone};
use super::StakeIbcKeeper;
use crate::domain::MsgRedeemStake;
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::redemption::{get_user_redemption_record, set_user_redemption_record};
use lsc_records::keeper::unbonding::{get_epoch_unbonding_record, set_host_zone_unbonding};
use lsc_records::{user_redemption_record_id, HostZoneUnbonding, HostZoneUnbondingStatus, UserRedemptionRecord};
use shared_types::math::mul_floor;
use shared_types::{Coin, StakeEvent};
use tracing::info;

impl StakeIbcKeeper {
    /// Escrows stTokens in the zone's redemption account and books them
    /// against the current epoch's unbonding.
    ///
    /// Returns the user redemption record id.
    pub fn redeem_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgRedeemStake) -> StakeIbcResult<String> {
        ctx.branch(|ctx| self.apply_redeem_stake(ctx, msg))
    }

    fn apply_redeem_stake(&self, ctx: &mut BlockContext<'_>, msg: &MsgRedeemStake) -> StakeIbcResult<String> {
        if msg.amount.is_zero() {
            return Err(StakeIbcError::ZeroAmount);
        }
        let zone = must_get_host_zone(ctx.store(), &msg.host_zone_id)?;
        ensure_accepting_user_actions(&zone)?;
        self.accounts.parse_bech32(&msg.receiver, &zone.bech32_prefix)?;

        let available = self.bank.balance(ctx.store(), &msg.creator, &zone.derivative_denom)?;
        if available < msg.amount {
            return Err(StakeIbcError::InsufficientBalance {
                address: msg.creator.clone(),
                denom: zone.derivative_denom.clone(),
                required: msg.amount,
                available,
            });
        }
        let native_estimate = mul_floor(msg.amount, zone.redemption_rate)?;
        if native_estimate > zone.total_delegations {
            return Err(StakeIbcError::InsufficientBalance {
                address: zone.chain_id.clone(),
                denom: zone.host_denom.clone(),
                required: native_estimate,
                available: zone.total_delegations,
            });
        }

        self.bank.send(
            ctx.store_mut(),
            &msg.creator,
            &zone.redemption_module_address,
            &Coin::new(msg.amount, zone.derivative_denom.clone()),
        )?;

        let epoch = self.current_stride_epoch(ctx.store())?;
        let mut unbonding = get_epoch_unbonding_record(ctx.store(), epoch)?
            .and_then(|record| record.host_zone_unbonding(&zone.chain_id).cloned())
            .unwrap_or_else(|| HostZoneUnbonding::new(zone.chain_id.clone(), zone.host_denom.clone()));
        if unbonding.status != HostZoneUnbondingStatus::UnbondingQueue {
            return Err(StakeIbcError::InvalidRedemptionRecord(format!(
                "unbonding for {} in epoch {epoch} is {}",
                zone.chain_id,
                unbonding.status.as_str()
            )));
        }
        unbonding.st_token_amount = unbonding.st_token_amount.checked_add(msg.amount)?;

        let id = user_redemption_record_id(epoch, &zone.chain_id, &msg.creator);
        let record = match get_user_redemption_record(ctx.store(), &id)? {
            Some(mut existing) => {
                existing.st_token_amount = existing.st_token_amount.checked_add(msg.amount)?;
                existing.receiver = msg.receiver.clone();
                existing
            }
            None => UserRedemptionRecord {
                id: id.clone(),
                sender: msg.creator.clone(),
                receiver: msg.receiver.clone(),
                st_token_amount: msg.amount,
                native_token_amount: shared_types::Int::zero(),
                denom: zone.host_denom.clone(),
                host_zone_id: zone.chain_id.clone(),
                epoch_number: epoch,
                claim_is_pending: false,
            },
        };
        set_user_redemption_record(ctx.store_mut(), &record)?;
        unbonding.add_redemption_id(&id);
        set_host_zone_unbonding(ctx.store_mut(), epoch, unbonding)?;

        info!(
            chain_id = %zone.chain_id,
            redeemer = %msg.creator,
            st_amount = %msg.amount,
            epoch,
            "Redeem stake"
        );
        ctx.emit(StakeEvent::RedeemStake {
            chain_id: zone.chain_id,
            redeemer: msg.creator.clone(),
            receiver: msg.receiver.clone(),
            st_amount: msg.amount,
            epoch,
        });
        Ok(id)
    }
}
