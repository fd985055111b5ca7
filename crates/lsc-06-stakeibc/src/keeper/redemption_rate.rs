//! Once-per-epoch recomputation of the redemption rate and its bounds check.

use super::host_zone::{must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{HostZone, RateStatus, RedemptionRateNumerator};
use crate::error::StakeIbcResult;
use lsc_ledger_store::{BlockContext, KvRead};
use lsc_records::keeper::deposit::deposit_records_for_zone;
use lsc_records::keeper::lsm::lsm_deposits_for_zone;
use lsc_records::{DepositRecordSource, DepositRecordStatus};
use shared_types::math::{bps_of, mul_floor};
use shared_types::{Dec, StakeEvent};
use tracing::{info, warn};

impl StakeIbcKeeper {
    /// Native value backing the zone's stTokens. Each deposit record lands
    /// in exactly one bucket until it is deleted.
    pub fn redemption_rate_numerator(
        &self,
        store: &impl KvRead,
        zone: &HostZone,
    ) -> StakeIbcResult<RedemptionRateNumerator> {
        let mut numerator = RedemptionRateNumerator {
            delegated_balance: zone.total_delegations,
            ..Default::default()
        };

        for record in deposit_records_for_zone(store, &zone.chain_id)? {
            use DepositRecordStatus::*;
            match (record.source, record.status) {
                (_, DelegationInProgress) | (DepositRecordSource::WithdrawalIca, DelegationQueue) => {
                    numerator.undelegated_balance = numerator.undelegated_balance.checked_add(record.amount)?;
                }
                (DepositRecordSource::StrideDeposit, TransferQueue | TransferInProgress | DelegationQueue) => {
                    numerator.in_flight_deposits = numerator.in_flight_deposits.checked_add(record.amount)?;
                }
                (DepositRecordSource::WithdrawalIca, TransferQueue | TransferInProgress) => {
                    warn!(chain_id = %zone.chain_id, record_id = record.id, "Reinvest record in a transfer status");
                }
            }
        }

        let commission = bps_of(zone.reward_balance, self.params.stride_commission_bps)?;
        numerator.reward_balance = zone.reward_balance.checked_sub(commission)?;

        for deposit in lsm_deposits_for_zone(store, &zone.chain_id)? {
            let rate = zone
                .validator(&deposit.validator_address)
                .map(|v| v.shares_to_tokens_rate)
                .unwrap_or_else(Dec::zero);
            numerator.lsm_balance = numerator.lsm_balance.checked_add(mul_floor(deposit.amount, rate)?)?;
        }
        Ok(numerator)
    }

    /// Recomputes the rate and applies the bounds:
    /// inside the inner bounds clears the freeze, between inner and outer
    /// freezes user actions, beyond the outer bounds halts the zone.
    pub(super) fn update_redemption_rate(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let st_supply = self.bank.supply(ctx.store(), &zone.derivative_denom)?;
        let numerator = self.redemption_rate_numerator(ctx.store(), &zone)?;
        let Some(rate) = numerator.rate(st_supply)? else {
            return Ok(());
        };

        let previous = zone.redemption_rate;
        zone.last_redemption_rate = previous;
        zone.redemption_rate = rate;

        let status = zone.bounds().classify(rate);
        match status {
            RateStatus::Accepted => zone.redemption_rate_frozen = false,
            RateStatus::Frozen => zone.redemption_rate_frozen = true,
            RateStatus::OutsideOuter => {}
        }
        set_host_zone(ctx.store_mut(), &zone)?;

        info!(
            chain_id,
            previous = %previous,
            current = %rate,
            st_supply = %st_supply,
            delegated = %numerator.delegated_balance,
            undelegated = %numerator.undelegated_balance,
            in_flight = %numerator.in_flight_deposits,
            "Redemption rate updated"
        );
        ctx.emit(StakeEvent::RedemptionRateUpdated {
            chain_id: chain_id.to_string(),
            previous,
            current: rate,
        });

        match status {
            RateStatus::Accepted => {}
            RateStatus::Frozen => {
                warn!(chain_id, rate = %rate, "Redemption rate outside inner bounds, frozen");
                ctx.emit(StakeEvent::RedemptionRateFrozen {
                    chain_id: chain_id.to_string(),
                    rate,
                });
            }
            RateStatus::OutsideOuter => {
                self.halt_host_zone(ctx, chain_id, &format!("redemption rate {rate} outside outer bounds"))?;
            }
        }
        Ok(())
    }
}
