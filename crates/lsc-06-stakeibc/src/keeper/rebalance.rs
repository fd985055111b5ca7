use super::host_zone::{must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::{plan_rebalance, CallbackArgs, HostZone, IcaAccountType, Rebalancing, RemoteMsg};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_icacallbacks::AckResponse;
use lsc_ledger_store::BlockContext;
use shared_types::{Coin, StakeEvent};
use tracing::{debug, info, warn};

impl StakeIbcKeeper {
    /// Whether the day epoch that just ended is a rebalance day for `zone`.
    pub(super) fn rebalance_due(&self, zone: &HostZone, ended_day_epoch: u64) -> bool {
        let interval = self
            .params
            .rebalance_interval_day_epochs
            .unwrap_or(zone.unbonding_period_days);
        interval > 0 && ended_day_epoch % interval == 0
    }

    /// Redelegates from surplus to deficit validators.
    pub(super) fn rebalance(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let busy = zone
            .validators
            .iter()
            .any(|v| v.delegation_changes_in_progress > 0 || v.slash_query_in_progress);
        if busy {
            debug!(chain_id, "Validator changes in flight, rebalance deferred");
            return Ok(());
        }

        let max_messages = usize::try_from(zone.max_messages_per_ica_tx).unwrap_or(usize::MAX).max(1);
        let plan = plan_rebalance(&zone.validators, max_messages)?;
        if plan.is_empty() {
            return Ok(());
        }
        let delegator = Self::ica_address(&zone, IcaAccountType::Delegation)?;

        let mut msgs = Vec::with_capacity(plan.len());
        for step in &plan {
            for address in [&step.src_validator, &step.dst_validator] {
                zone.validator_mut(address)
                    .ok_or_else(|| StakeIbcError::Internal(format!("rebalance names unknown validator {address}")))?
                    .begin_change();
            }
            msgs.push(RemoteMsg::Redelegate {
                delegator: delegator.clone(),
                src_validator: step.src_validator.clone(),
                dst_validator: step.dst_validator.clone(),
                amount: Coin::new(step.amount, zone.host_denom.clone()),
            });
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        self.submit_ica_tx(
            ctx,
            &zone,
            IcaAccountType::Delegation,
            msgs,
            CallbackArgs::Rebalance {
                chain_id: chain_id.to_string(),
                rebalancings: plan.clone(),
            },
        )?;
        info!(chain_id, redelegations = plan.len(), "Rebalance submitted");
        Ok(())
    }

    pub(super) fn on_rebalance(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        rebalancings: &[Rebalancing],
        ack: &AckResponse,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        for step in rebalancings {
            for address in [&step.src_validator, &step.dst_validator] {
                let validator = zone
                    .validator_mut(address)
                    .ok_or_else(|| StakeIbcError::Internal(format!("rebalance names unknown validator {address}")))?;
                if !validator.end_change() {
                    return Err(StakeIbcError::Internal(format!("no change in flight for {address}")));
                }
            }
        }

        if ack.is_success() {
            for step in rebalancings {
                let src = zone
                    .validator_mut(&step.src_validator)
                    .ok_or_else(|| StakeIbcError::Internal(format!("unknown validator {}", step.src_validator)))?;
                src.delegation = src.delegation.checked_sub(step.amount).map_err(|_| {
                    StakeIbcError::Internal(format!("redelegation exceeds delegation of {}", step.src_validator))
                })?;
                let dst = zone
                    .validator_mut(&step.dst_validator)
                    .ok_or_else(|| StakeIbcError::Internal(format!("unknown validator {}", step.dst_validator)))?;
                dst.delegation = dst.delegation.checked_add(step.amount)?;
                ctx.emit(StakeEvent::Redelegated {
                    chain_id: chain_id.to_string(),
                    src_validator: step.src_validator.clone(),
                    dst_validator: step.dst_validator.clone(),
                    amount: step.amount,
                });
            }
        } else {
            warn!(chain_id, outcome = %ack.status, "Rebalance failed");
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        Ok(())
    }
}
