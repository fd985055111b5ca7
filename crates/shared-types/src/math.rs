//! # Fixed-Point Math
//!
//! Floor-rounding helpers over `Uint128` amounts and 18-digit `Decimal` rates.
//!
//! Every helper multiplies before it divides, so a rate is never truncated
//! ahead of the amount it scales.

use crate::errors::{MathError, MathResult};
use cosmwasm_std::{Decimal, Uint128};

/// Token amount.
pub type Int = Uint128;

/// Rate or ratio with 18 fractional digits.
pub type Dec = Decimal;

/// Basis points in one whole.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// `floor(amount * rate)`.
pub fn mul_floor(amount: Int, rate: Dec) -> MathResult<Int> {
    Ok(amount.checked_multiply_ratio(rate.atomics(), Dec::one().atomics())?)
}

/// `floor(amount / rate)`.
pub fn div_floor(amount: Int, rate: Dec) -> MathResult<Int> {
    if rate.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(amount.checked_multiply_ratio(Dec::one().atomics(), rate.atomics())?)
}

/// `floor(amount * numerator / denominator)`.
pub fn mul_ratio_floor(amount: Int, numerator: Int, denominator: Int) -> MathResult<Int> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(amount.checked_multiply_ratio(numerator, denominator)?)
}

/// `numerator / denominator` as a decimal.
pub fn ratio(numerator: Int, denominator: Int) -> MathResult<Dec> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(Dec::checked_from_ratio(numerator, denominator)?)
}

/// A basis-point value as a decimal (`100` -> `0.01`).
pub fn bps(value: u64) -> MathResult<Dec> {
    Ok(Dec::checked_from_ratio(value, BPS_DENOMINATOR)?)
}

/// `floor(amount * value_bps / 10_000)`.
pub fn bps_of(amount: Int, value_bps: u64) -> MathResult<Int> {
    mul_ratio_floor(amount, Int::from(value_bps), Int::from(BPS_DENOMINATOR))
}

/// Sum of amounts, failing on overflow.
pub fn checked_sum<I>(amounts: I) -> MathResult<Int>
where
    I: IntoIterator<Item = Int>,
{
    amounts
        .into_iter()
        .try_fold(Int::zero(), |acc, amount| acc.checked_add(amount))
        .map_err(MathError::from)
}
