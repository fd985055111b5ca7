//! # Epoch Pipeline
//!
//! ```text
//!  stride_epoch ─► open unbonding record ─► prune queries / claimed unbondings
//!                  └─ per zone: transfer → lsm transfer → detokenize → delegate
//!                               → undelegate → claim rewards → queries → rate
//!  day ──────────► per zone: exit transfers → rebalance (on cadence)
//! ```
//!
//! Each stage of each zone runs in its own branch. A failing stage is
//! logged and rolled back without touching the other zones; an invariant
//! violation halts its zone, and halted zones are skipped from then on.

use super::host_zone::{all_host_zones, get_host_zone};
use super::StakeIbcKeeper;
use crate::error::StakeIbcResult;
use lsc_epochs::{EpochHooks, EpochTick, DAY_EPOCH, STRIDE_EPOCH};
use lsc_ledger_store::BlockContext;
use lsc_records::keeper::unbonding::{create_epoch_unbonding_record, prune_claimed_unbondings};
use tracing::{debug, error, info};

type Stage = fn(&StakeIbcKeeper, &mut BlockContext<'_>, &str) -> StakeIbcResult<()>;

const STRIDE_STAGES: [(&str, Stage); 8] = [
    ("transfer_deposits", StakeIbcKeeper::transfer_deposits),
    ("transfer_lsm_deposits", StakeIbcKeeper::transfer_lsm_deposits),
    ("detokenize_lsm_deposits", StakeIbcKeeper::detokenize_lsm_deposits),
    ("delegate_deposits", StakeIbcKeeper::delegate_deposits),
    ("undelegate_unbondings", StakeIbcKeeper::undelegate_unbondings),
    ("claim_rewards", StakeIbcKeeper::claim_rewards),
    ("schedule_queries", StakeIbcKeeper::schedule_queries),
    ("update_redemption_rate", StakeIbcKeeper::update_redemption_rate),
];

impl EpochHooks for StakeIbcKeeper {
    fn after_epoch_end(&self, ctx: &mut BlockContext<'_>, tick: &EpochTick) {
        let result = if tick.is(STRIDE_EPOCH) {
            self.on_stride_epoch(ctx, tick)
        } else if tick.is(DAY_EPOCH) {
            self.on_day_epoch(ctx, tick)
        } else {
            Ok(())
        };
        if let Err(err) = result {
            error!(identifier = %tick.identifier, epoch = tick.new_epoch, error = %err, "Epoch hook failed");
        }
    }
}

impl StakeIbcKeeper {
    fn on_stride_epoch(&self, ctx: &mut BlockContext<'_>, tick: &EpochTick) -> StakeIbcResult<()> {
        let zones = all_host_zones(ctx.store())?;
        let entries: Vec<(String, String)> = zones
            .iter()
            .map(|zone| (zone.chain_id.clone(), zone.host_denom.clone()))
            .collect();
        create_epoch_unbonding_record(ctx.store_mut(), tick.new_epoch, &entries)?;
        self.prune_expired_queries(ctx)?;
        let pruned = prune_claimed_unbondings(ctx.store_mut())?;
        if !pruned.is_empty() {
            debug!(epochs = ?pruned, "Claimed unbonding records pruned");
        }

        info!(epoch = tick.new_epoch, zones = zones.len(), "Stride epoch started");
        for zone in &zones {
            for (name, stage) in STRIDE_STAGES {
                self.run_stage(ctx, &zone.chain_id, name, stage)?;
            }
        }
        Ok(())
    }

    fn on_day_epoch(&self, ctx: &mut BlockContext<'_>, tick: &EpochTick) -> StakeIbcResult<()> {
        for zone in all_host_zones(ctx.store())? {
            self.run_stage(ctx, &zone.chain_id, "transfer_exited_unbondings", Self::transfer_exited_unbondings)?;
            if self.rebalance_due(&zone, tick.ended_epoch) {
                self.run_stage(ctx, &zone.chain_id, "rebalance", Self::rebalance)?;
            }
        }
        Ok(())
    }

    /// Runs one stage for a live zone inside a branch. Only a failure to
    /// halt the zone propagates.
    fn run_stage(&self, ctx: &mut BlockContext<'_>, chain_id: &str, name: &str, stage: Stage) -> StakeIbcResult<()> {
        match get_host_zone(ctx.store(), chain_id)? {
            Some(zone) if !zone.halted => {}
            _ => return Ok(()),
        }
        if let Err(err) = ctx.branch(|ctx| stage(self, ctx, chain_id)) {
            error!(chain_id, stage = name, error = %err, "Epoch stage failed");
            if err.is_invariant_violation() {
                self.halt_host_zone(ctx, chain_id, &format!("{name}: {err}"))?;
            }
        }
        Ok(())
    }
}
