//! # Interchain Queries
//!
//! Proof-backed reads of host state. Each kind has one submitter and one
//! handler; the handler runs in its own store branch once the response is
//! accepted, so a failing handler never leaves the query half-applied.
//!
//! ```text
//!  tracker ≥ checkpoint ─► validator_exchange_rate ─► slash? ─► delegator_shares
//!  stride tick ─────────► withdrawal_balance ──────► reward sweep
//! ```

use super::host_zone::{get_host_zone, must_get_host_zone, set_host_zone};
use super::StakeIbcKeeper;
use crate::domain::queries::{DELEGATOR_SHARES, VALIDATOR_EXCHANGE_RATE, WITHDRAWAL_BALANCE};
use crate::domain::{HostQueryResult, HostZone, IcaAccountType, QueryContext};
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_interchain_query::{Query, QueryRequest, BANK_STORE_QUERY, STAKING_STORE_QUERY};
use lsc_ledger_store::BlockContext;
use shared_types::math::{bps_of, div_floor, mul_floor};
use shared_types::{Dec, Int, StakeEvent};
use tracing::{debug, error, info, warn};

/// Re-arms every validator's slash-query checkpoint against the current
/// total delegation.
pub(super) fn reset_slash_checkpoints(zone: &mut HostZone, threshold_bps: u64) -> StakeIbcResult<()> {
    let checkpoint = bps_of(zone.total_delegations, threshold_bps)?;
    for validator in zone.validators.iter_mut() {
        validator.slash_query_checkpoint = checkpoint;
    }
    Ok(())
}

impl StakeIbcKeeper {
    fn submit_host_query(
        &self,
        ctx: &mut BlockContext<'_>,
        zone: &HostZone,
        query_type: &str,
        request_data: String,
        callback_id: &str,
        context: &QueryContext,
    ) -> StakeIbcResult<Query> {
        Ok(lsc_interchain_query::submit_query(
            ctx,
            QueryRequest {
                chain_id: zone.chain_id.clone(),
                connection_id: zone.connection_id.clone(),
                query_type: query_type.to_string(),
                request_data: request_data.into_bytes(),
                callback_id: callback_id.to_string(),
                callback_data: context.encode()?,
                timeout_nanos: self.params.query_ttl_nanos,
            },
        )?)
    }

    /// Marks the validator's query in flight and submits it. The caller
    /// persists `zone`.
    pub(super) fn submit_exchange_rate_query(
        &self,
        ctx: &mut BlockContext<'_>,
        zone: &mut HostZone,
        validator: &str,
    ) -> StakeIbcResult<()> {
        let chain_id = zone.chain_id.clone();
        let entry = zone
            .validator_mut(validator)
            .ok_or_else(|| StakeIbcError::Internal(format!("{validator} is not in the {chain_id} set")))?;
        entry.slash_query_in_progress = true;
        let context = QueryContext::Validator {
            chain_id,
            validator: validator.to_string(),
            delegation_at_submission: entry.delegation,
        };
        self.submit_host_query(
            ctx,
            zone,
            STAKING_STORE_QUERY,
            format!("validator/{validator}"),
            VALIDATOR_EXCHANGE_RATE,
            &context,
        )?;
        Ok(())
    }

    fn submit_delegator_shares_query(
        &self,
        ctx: &mut BlockContext<'_>,
        zone: &HostZone,
        validator: &str,
        delegation: Int,
    ) -> StakeIbcResult<()> {
        let delegator = Self::ica_address(zone, IcaAccountType::Delegation)?;
        let context = QueryContext::Validator {
            chain_id: zone.chain_id.clone(),
            validator: validator.to_string(),
            delegation_at_submission: delegation,
        };
        self.submit_host_query(
            ctx,
            zone,
            STAKING_STORE_QUERY,
            format!("delegation/{delegator}/{validator}"),
            DELEGATOR_SHARES,
            &context,
        )?;
        Ok(())
    }

    fn submit_withdrawal_balance_query(&self, ctx: &mut BlockContext<'_>, zone: &HostZone) -> StakeIbcResult<()> {
        let address = Self::ica_address(zone, IcaAccountType::Withdrawal)?;
        let context = QueryContext::Zone {
            chain_id: zone.chain_id.clone(),
            sweep_generation: zone.reward_sweep_generation,
        };
        self.submit_host_query(
            ctx,
            zone,
            BANK_STORE_QUERY,
            format!("balance/{address}/{}", zone.host_denom),
            WITHDRAWAL_BALANCE,
            &context,
        )?;
        Ok(())
    }

    /// Stride-tick stage: a withdrawal balance query per zone, and an
    /// exchange-rate query for each validator past its checkpoint.
    pub(super) fn schedule_queries(&self, ctx: &mut BlockContext<'_>, chain_id: &str) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        if zone.ica(IcaAccountType::Withdrawal).is_some() && !zone.reward_sweep_in_progress {
            self.submit_withdrawal_balance_query(ctx, &zone)?;
        }

        let due: Vec<String> = zone
            .validators
            .iter()
            .filter(|validator| validator.needs_slash_query())
            .map(|validator| validator.address.clone())
            .collect();
        if due.is_empty() {
            return Ok(());
        }
        for validator in &due {
            self.submit_exchange_rate_query(ctx, &mut zone, validator)?;
        }
        set_host_zone(ctx.store_mut(), &zone)?;
        debug!(chain_id, validators = due.len(), "Exchange rate queries scheduled");
        Ok(())
    }

    /// Delivers a relayed query response.
    ///
    /// # Returns
    /// - `Err(QueryRejected)`: The query is unknown or past its TTL
    /// - `Ok(())`: The response was accepted; handler failures are logged
    ///   and an invariant violation halts the zone
    pub fn on_query_response(&self, ctx: &mut BlockContext<'_>, query_id: &str, result: &[u8]) -> StakeIbcResult<()> {
        let query = lsc_interchain_query::accept_response(ctx, query_id)?;
        if let Err(err) = ctx.branch(|ctx| self.dispatch_query(ctx, &query, result)) {
            error!(
                chain_id = %query.chain_id,
                query_id,
                callback_id = %query.callback_id,
                error = %err,
                "Query handler failed"
            );
            if err.is_invariant_violation() {
                self.halt_host_zone(ctx, &query.chain_id, &err.to_string())?;
            }
        }
        Ok(())
    }

    fn dispatch_query(&self, ctx: &mut BlockContext<'_>, query: &Query, result: &[u8]) -> StakeIbcResult<()> {
        let context = QueryContext::decode(&query.callback_data)?;
        let result = HostQueryResult::decode(result)?;
        match (query.callback_id.as_str(), context, result) {
            (
                VALIDATOR_EXCHANGE_RATE,
                QueryContext::Validator { chain_id, validator, .. },
                HostQueryResult::ExchangeRate { shares_to_tokens_rate },
            ) => self.on_exchange_rate(ctx, &chain_id, &validator, shares_to_tokens_rate),
            (
                DELEGATOR_SHARES,
                QueryContext::Validator {
                    chain_id,
                    validator,
                    delegation_at_submission,
                },
                HostQueryResult::DelegatorShares { shares },
            ) => self.on_delegator_shares(ctx, &chain_id, &validator, delegation_at_submission, shares),
            (
                WITHDRAWAL_BALANCE,
                QueryContext::Zone {
                    chain_id,
                    sweep_generation,
                },
                HostQueryResult::Balance { amount },
            ) => self.on_withdrawal_balance(ctx, &chain_id, sweep_generation, amount),
            (callback_id, _, _) => Err(StakeIbcError::CallbackDecode(format!(
                "response does not match query kind {callback_id}"
            ))),
        }
    }

    fn on_exchange_rate(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        validator: &str,
        new_rate: Dec,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let Some(entry) = zone.validator_mut(validator) else {
            warn!(chain_id, validator, "Exchange rate for a removed validator");
            return Ok(());
        };
        let old_rate = entry.shares_to_tokens_rate;
        let mut slashed = Int::zero();
        if new_rate < old_rate && !old_rate.is_zero() {
            let remaining = div_floor(mul_floor(entry.delegation, new_rate)?, old_rate)?;
            slashed = entry.delegation.checked_sub(remaining)?;
            entry.delegation = remaining;
        }
        entry.shares_to_tokens_rate = new_rate;
        entry.slash_query_in_progress = false;
        entry.slash_query_progress_tracker = Int::zero();
        let delegation = entry.delegation;

        if !slashed.is_zero() {
            zone.total_delegations = zone.total_delegations.checked_sub(slashed)?;
            warn!(
                chain_id,
                validator,
                old_rate = %old_rate,
                new_rate = %new_rate,
                slashed = %slashed,
                "Validator slash detected"
            );
            ctx.emit(StakeEvent::SlashDetected {
                chain_id: chain_id.to_string(),
                validator: validator.to_string(),
                slashed_tokens: slashed,
                new_rate,
            });
            if zone.ica(IcaAccountType::Delegation).is_some() {
                self.submit_delegator_shares_query(ctx, &zone, validator, delegation)?;
            }
        } else {
            debug!(chain_id, validator, rate = %new_rate, "Exchange rate refreshed");
        }
        reset_slash_checkpoints(&mut zone, self.params.slash_query_threshold_bps)?;
        set_host_zone(ctx.store_mut(), &zone)
    }

    /// Reconciles the local delegation with `shares × rate`. Ignored when
    /// the delegation moved since submission or a change is in flight.
    fn on_delegator_shares(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        validator: &str,
        delegation_at_submission: Int,
        shares: Dec,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        let max_slash_bps = self.params.max_slash_bps;
        let Some(entry) = zone.validator_mut(validator) else {
            warn!(chain_id, validator, "Delegator shares for a removed validator");
            return Ok(());
        };
        if entry.delegation != delegation_at_submission || entry.delegation_changes_in_progress > 0 {
            info!(chain_id, validator, "Delegation changed since shares query, ignored");
            return Ok(());
        }
        let implied = shares.checked_mul(entry.shares_to_tokens_rate)?.to_uint_floor();
        if implied >= entry.delegation {
            return Ok(());
        }
        let slashed = entry.delegation.checked_sub(implied)?;
        let ceiling = bps_of(entry.delegation, max_slash_bps)?;
        if slashed > ceiling {
            error!(
                chain_id,
                validator,
                delegation = %entry.delegation,
                implied = %implied,
                max_slash_bps,
                "Implied slash above the ceiling, delegation left unchanged"
            );
            return Ok(());
        }
        entry.delegation = implied;
        let new_rate = entry.shares_to_tokens_rate;
        zone.total_delegations = zone.total_delegations.checked_sub(slashed)?;
        set_host_zone(ctx.store_mut(), &zone)?;

        warn!(chain_id, validator, slashed = %slashed, "Delegation reconciled with host shares");
        ctx.emit(StakeEvent::SlashDetected {
            chain_id: chain_id.to_string(),
            validator: validator.to_string(),
            slashed_tokens: slashed,
            new_rate,
        });
        Ok(())
    }

    /// Records the withdrawal account balance and sweeps it. A balance read
    /// before the latest acknowledged sweep still counts the swept tokens and
    /// is dropped.
    fn on_withdrawal_balance(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        sweep_generation: u64,
        amount: Int,
    ) -> StakeIbcResult<()> {
        let mut zone = must_get_host_zone(ctx.store(), chain_id)?;
        if zone.reward_sweep_in_progress {
            debug!(chain_id, "Sweep in flight, withdrawal balance ignored");
            return Ok(());
        }
        if sweep_generation < zone.reward_sweep_generation {
            info!(
                chain_id,
                queried_at = sweep_generation,
                current = zone.reward_sweep_generation,
                "Withdrawal balance predates the last sweep, ignored"
            );
            return Ok(());
        }
        zone.reward_balance = amount;
        set_host_zone(ctx.store_mut(), &zone)?;
        if amount.is_zero() {
            return Ok(());
        }
        self.sweep_rewards(ctx, chain_id)
    }

    /// Drops expired queries and releases the validators they held.
    pub(super) fn prune_expired_queries(&self, ctx: &mut BlockContext<'_>) -> StakeIbcResult<()> {
        for query in lsc_interchain_query::prune_expired(ctx)? {
            if query.callback_id != VALIDATOR_EXCHANGE_RATE {
                continue;
            }
            let context = QueryContext::decode(&query.callback_data)?;
            let Some(validator) = context.validator() else {
                continue;
            };
            let Some(mut zone) = get_host_zone(ctx.store(), &query.chain_id)? else {
                continue;
            };
            if let Some(entry) = zone.validator_mut(validator) {
                entry.slash_query_in_progress = false;
                set_host_zone(ctx.store_mut(), &zone)?;
            }
        }
        Ok(())
    }
}
