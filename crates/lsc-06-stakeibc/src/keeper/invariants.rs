//! End-block consistency checks.

use super::host_zone::all_host_zones;
use super::StakeIbcKeeper;
use crate::domain::{HostZone, RateStatus};
use crate::error::StakeIbcResult;
use lsc_ledger_store::{BlockContext, Store};
use shared_types::math::checked_sum;
use tracing::error;

impl StakeIbcKeeper {
    /// Halts every zone whose `total_delegations` differs from the sum of
    /// its validators' delegations. Returns the halted chain ids.
    pub fn check_delegation_totals(&self, ctx: &mut BlockContext<'_>) -> StakeIbcResult<Vec<String>> {
        let mut halted = Vec::new();
        for zone in all_host_zones(ctx.store())? {
            if zone.halted || zone.delegations_balanced() {
                continue;
            }
            error!(
                chain_id = %zone.chain_id,
                total = %zone.total_delegations,
                sum = ?zone.sum_validator_delegations(),
                "Delegation total out of balance"
            );
            self.halt_host_zone(ctx, &zone.chain_id, "delegation total out of balance")?;
            halted.push(zone.chain_id);
        }
        Ok(halted)
    }

    /// Whether the bank's supply of the zone's stToken equals the sum of
    /// all holder balances.
    pub fn st_supply_matches_holders(&self, store: &Store, zone: &HostZone) -> StakeIbcResult<bool> {
        let supply = self.bank.supply(store, &zone.derivative_denom)?;
        let held = checked_sum(
            self.bank
                .holders(store, &zone.derivative_denom)?
                .into_iter()
                .map(|(_, amount)| amount),
        )?;
        Ok(supply == held)
    }
}

/// A stored rate inside the outer bounds goes with a live zone, one outside
/// them with a halted zone.
pub fn halt_matches_redemption_rate(zone: &HostZone) -> bool {
    let outside = zone.bounds().classify(zone.redemption_rate) == RateStatus::OutsideOuter;
    outside == zone.halted
}
