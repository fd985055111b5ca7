//! # End-of-Block Invariants
//!
//! Checked against committed state after every block the test network
//! produces. Each check returns the first violation it finds.
//!
//! | Check | Property |
//! |-------|----------|
//! | [`delegation_totals`] | zone total equals the sum of validator delegations |
//! | [`st_supply`] | stToken supply equals the sum of holder balances |
//! | [`callback_rows`] | one callback row per pending packet, keys unique |
//! | [`rate_halt`] | a rate outside the outer bounds goes with a halted zone |
//! | [`deposit_accounting`] | each deposit record lands in the rate numerator once |
//! | [`UnbondingTracker`] | unbonding statuses only move along allowed edges |

use lsc_icacallbacks::PacketId;
use lsc_ledger_store::Store;
use lsc_records::keeper::deposit::deposit_records_for_zone;
use lsc_records::keeper::unbonding::all_epoch_unbonding_records;
use lsc_records::HostZoneUnbondingStatus;
use lsc_stakeibc::domain::RateStatus;
use lsc_stakeibc::keeper::all_host_zones;
use lsc_stakeibc::{PacketTransport, StakeIbcKeeper};
use shared_types::math::checked_sum;
use std::collections::{BTreeMap, BTreeSet};

pub type Violation = String;

pub fn delegation_totals(store: &Store) -> Result<(), Violation> {
    for zone in all_host_zones(store).map_err(|e| e.to_string())? {
        if !zone.delegations_balanced() {
            return Err(format!(
                "{}: total {} != validator sum {:?}",
                zone.chain_id,
                zone.total_delegations,
                zone.sum_validator_delegations()
            ));
        }
    }
    Ok(())
}

pub fn st_supply(keeper: &StakeIbcKeeper, store: &Store) -> Result<(), Violation> {
    for zone in all_host_zones(store).map_err(|e| e.to_string())? {
        if !keeper
            .st_supply_matches_holders(store, &zone)
            .map_err(|e| e.to_string())?
        {
            return Err(format!("{}: stToken supply differs from holder balances", zone.chain_id));
        }
    }
    Ok(())
}

pub fn callback_rows(store: &Store) -> Result<(), Violation> {
    let rows = lsc_icacallbacks::keeper::all(store).map_err(|e| e.to_string())?;
    let keys: BTreeSet<PacketId> = rows.iter().map(|row| row.packet.clone()).collect();
    if keys.len() != rows.len() {
        return Err(format!("{} callback rows share {} keys", rows.len(), keys.len()));
    }
    let packets = PacketTransport::new()
        .pending_packets(store)
        .map_err(|e| e.to_string())?;
    for sent in &packets {
        if !keys.contains(&sent.id()) {
            return Err(format!("pending packet {} has no callback row", sent.id()));
        }
    }
    if packets.len() != rows.len() {
        return Err(format!("{} callback rows for {} pending packets", rows.len(), packets.len()));
    }
    Ok(())
}

pub fn rate_halt(store: &Store) -> Result<(), Violation> {
    for zone in all_host_zones(store).map_err(|e| e.to_string())? {
        let outside = zone.bounds().classify(zone.redemption_rate) == RateStatus::OutsideOuter;
        if outside && !zone.halted {
            return Err(format!(
                "{}: rate {} outside outer bounds on a live zone",
                zone.chain_id, zone.redemption_rate
            ));
        }
    }
    Ok(())
}

pub fn deposit_accounting(keeper: &StakeIbcKeeper, store: &Store) -> Result<(), Violation> {
    for zone in all_host_zones(store).map_err(|e| e.to_string())? {
        let numerator = keeper
            .redemption_rate_numerator(store, &zone)
            .map_err(|e| e.to_string())?;
        let records = deposit_records_for_zone(store, &zone.chain_id).map_err(|e| e.to_string())?;
        let booked = checked_sum(records.iter().map(|record| record.amount)).map_err(|e| e.to_string())?;
        let counted = numerator.undelegated_balance + numerator.in_flight_deposits;
        if counted != booked {
            return Err(format!(
                "{}: numerator counts {counted} of {booked} booked deposits",
                zone.chain_id
            ));
        }
    }
    Ok(())
}

const STATUSES: [HostZoneUnbondingStatus; 5] = [
    HostZoneUnbondingStatus::UnbondingQueue,
    HostZoneUnbondingStatus::UnbondingInProgress,
    HostZoneUnbondingStatus::ExitTransferQueue,
    HostZoneUnbondingStatus::ExitTransferInProgress,
    HostZoneUnbondingStatus::Claimable,
];

/// Whether `to` can be reached from `from` along allowed edges.
pub fn reachable(from: HostZoneUnbondingStatus, to: HostZoneUnbondingStatus) -> bool {
    let mut seen = BTreeSet::from([from]);
    let mut frontier = vec![from];
    while let Some(status) = frontier.pop() {
        if status == to {
            return true;
        }
        for next in STATUSES {
            if status.can_transition_to(next) && seen.insert(next) {
                frontier.push(next);
            }
        }
    }
    false
}

/// Remembers each `(epoch, chain)` unbonding status between blocks.
#[derive(Debug, Default)]
pub struct UnbondingTracker {
    previous: BTreeMap<(u64, String), HostZoneUnbondingStatus>,
}

impl UnbondingTracker {
    pub fn observe(&mut self, store: &Store) -> Result<(), Violation> {
        let mut current = BTreeMap::new();
        for record in all_epoch_unbonding_records(store).map_err(|e| e.to_string())? {
            for unbonding in record.host_zone_unbondings {
                current.insert((record.epoch_number, unbonding.host_zone_id), unbonding.status);
            }
        }
        for (key, status) in &current {
            if let Some(before) = self.previous.get(key) {
                if !reachable(*before, *status) {
                    return Err(format!(
                        "epoch {} {}: {} -> {}",
                        key.0,
                        key.1,
                        before.as_str(),
                        status.as_str()
                    ));
                }
            }
        }
        self.previous = current;
        Ok(())
    }
}

/// Runs every check. Unbonding transitions are tracked across calls.
pub fn check_all(keeper: &StakeIbcKeeper, store: &Store, tracker: &mut UnbondingTracker) -> Result<(), Violation> {
    delegation_totals(store)?;
    st_supply(keeper, store)?;
    callback_rows(store)?;
    rate_halt(store)?;
    deposit_accounting(keeper, store)?;
    tracker.observe(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use HostZoneUnbondingStatus::*;

    #[test]
    fn test_reachability_follows_edges() {
        assert!(reachable(UnbondingQueue, Claimable));
        assert!(reachable(UnbondingInProgress, UnbondingQueue));
        assert!(reachable(ExitTransferInProgress, ExitTransferQueue));
        assert!(!reachable(ExitTransferQueue, UnbondingQueue));
        assert!(!reachable(Claimable, ExitTransferQueue));
    }
}
