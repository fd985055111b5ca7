//! # Validator Allocation
//!
//! Pure planning over a zone's validator set:
//!
//! - [`allocate_delegation`]: largest-remainder split of a deposit by weight.
//! - [`allocate_undelegation`]: withdraws first from validators furthest
//!   above their weight target.
//! - [`plan_rebalance`]: pairs surplus with deficit validators.
//!
//! Every plan sums exactly to its input and never drives a delegation below
//! zero. Ties break on the byte order of validator addresses.

use super::validator::Validator;
use crate::error::{StakeIbcError, StakeIbcResult};
use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};
use shared_types::math::{checked_sum, mul_ratio_floor};
use shared_types::{Int, MathError};
use std::cmp::Reverse;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorAmount {
    pub validator: String,
    pub amount: Int,
}

impl ValidatorAmount {
    pub fn new(validator: impl Into<String>, amount: Int) -> Self {
        Self {
            validator: validator.into(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rebalancing {
    pub src_validator: String,
    pub dst_validator: String,
    pub amount: Int,
}

/// Splits `total` across `weights` proportionally. Floors first, then hands
/// the remainder out one unit at a time by descending fractional part.
/// `None` when every weight is zero.
fn weighted_split(total: Int, weights: &[(&str, u64)]) -> StakeIbcResult<Option<Vec<Int>>> {
    let denominator = checked_sum(weights.iter().map(|(_, w)| Int::from(*w)))?;
    if denominator.is_zero() {
        return Ok(None);
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (index, (address, weight)) in weights.iter().enumerate() {
        shares.push(mul_ratio_floor(total, Int::from(*weight), denominator)?);
        let remainder = total
            .full_mul(*weight)
            .checked_rem(Uint256::from(denominator))
            .map_err(|e| MathError::Overflow(e.to_string()))?;
        remainders.push((Reverse(remainder), *address, index));
    }

    let assigned = checked_sum(shares.iter().copied())?;
    let mut leftover = total
        .checked_sub(assigned)
        .map_err(|e| MathError::Overflow(e.to_string()))?
        .u128();

    remainders.sort();
    for (_, _, index) in remainders {
        if leftover == 0 {
            break;
        }
        if weights[index].1 == 0 {
            continue;
        }
        shares[index] += Int::one();
        leftover -= 1;
    }
    Ok(Some(shares))
}

/// Splits a deposit across weighted validators with fewer than
/// `max_changes_in_progress` changes in flight. Zero shares are dropped.
pub fn allocate_delegation(
    amount: Int,
    validators: &[Validator],
    max_changes_in_progress: u32,
) -> StakeIbcResult<Vec<ValidatorAmount>> {
    let eligible: Vec<&Validator> = validators
        .iter()
        .filter(|v| v.is_delegation_eligible())
        .filter(|v| v.delegation_changes_in_progress < max_changes_in_progress)
        .collect();
    let weights: Vec<(&str, u64)> = eligible.iter().map(|v| (v.address.as_str(), v.weight)).collect();

    let shares = weighted_split(amount, &weights)?.ok_or_else(|| {
        StakeIbcError::NoDelegationCapacity("no weighted validator can take new delegations".into())
    })?;

    Ok(eligible
        .iter()
        .zip(shares)
        .filter(|(_, share)| !share.is_zero())
        .map(|(v, share)| ValidatorAmount::new(v.address.clone(), share))
        .collect())
}

/// Chooses undelegations summing to `amount`. Validators are drained in
/// order of `delegation - target`, where targets split the post-undelegation
/// total by weight; any residue is then taken from the largest delegations.
pub fn allocate_undelegation(amount: Int, validators: &[Validator]) -> StakeIbcResult<Vec<ValidatorAmount>> {
    let total = checked_sum(validators.iter().map(|v| v.delegation))?;
    if amount > total {
        return Err(StakeIbcError::NoDelegationCapacity(format!(
            "cannot undelegate {amount} from {total} delegated"
        )));
    }
    let remaining_total = total - amount;
    let weights: Vec<(&str, u64)> = validators.iter().map(|v| (v.address.as_str(), v.weight)).collect();
    let targets = weighted_split(remaining_total, &weights)?
        .unwrap_or_else(|| vec![Int::zero(); validators.len()]);

    let mut taken = vec![Int::zero(); validators.len()];
    let mut remaining = amount;

    let mut by_surplus: Vec<(Reverse<Int>, &str, usize)> = validators
        .iter()
        .zip(&targets)
        .enumerate()
        .map(|(i, (v, target))| (Reverse(v.delegation.saturating_sub(*target)), v.address.as_str(), i))
        .collect();
    by_surplus.sort();
    for (Reverse(capacity), _, index) in by_surplus {
        if remaining.is_zero() {
            break;
        }
        let take = capacity.min(remaining);
        taken[index] += take;
        remaining -= take;
    }

    if !remaining.is_zero() {
        let mut by_delegation: Vec<(Reverse<Int>, &str, usize)> = validators
            .iter()
            .enumerate()
            .map(|(i, v)| (Reverse(v.delegation - taken[i]), v.address.as_str(), i))
            .collect();
        by_delegation.sort();
        for (Reverse(available), _, index) in by_delegation {
            if remaining.is_zero() {
                break;
            }
            let take = available.min(remaining);
            taken[index] += take;
            remaining -= take;
        }
    }

    Ok(validators
        .iter()
        .zip(taken)
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(v, amount)| ValidatorAmount::new(v.address.clone(), amount))
        .collect())
}

/// Redelegations moving the set toward its weight targets, at most
/// `max_messages` of them, largest surplus and deficit first.
pub fn plan_rebalance(validators: &[Validator], max_messages: usize) -> StakeIbcResult<Vec<Rebalancing>> {
    let total = checked_sum(validators.iter().map(|v| v.delegation))?;
    let weights: Vec<(&str, u64)> = validators.iter().map(|v| (v.address.as_str(), v.weight)).collect();
    let Some(targets) = weighted_split(total, &weights)? else {
        return Ok(Vec::new());
    };

    let mut surplus: Vec<(Reverse<Int>, &str)> = Vec::new();
    let mut deficit: Vec<(Reverse<Int>, &str)> = Vec::new();
    for (v, target) in validators.iter().zip(targets) {
        if v.delegation > target {
            surplus.push((Reverse(v.delegation - target), v.address.as_str()));
        } else if target > v.delegation {
            deficit.push((Reverse(target - v.delegation), v.address.as_str()));
        }
    }
    surplus.sort();
    deficit.sort();

    let mut plan = Vec::new();
    let (mut s, mut d) = (0, 0);
    while s < surplus.len() && d < deficit.len() && plan.len() < max_messages {
        let amount = surplus[s].0 .0.min(deficit[d].0 .0);
        plan.push(Rebalancing {
            src_validator: surplus[s].1.to_string(),
            dst_validator: deficit[d].1.to_string(),
            amount,
        });
        surplus[s].0 .0 -= amount;
        deficit[d].0 .0 -= amount;
        if surplus[s].0 .0.is_zero() {
            s += 1;
        }
        if deficit[d].0 .0.is_zero() {
            d += 1;
        }
    }
    Ok(plan)
}
