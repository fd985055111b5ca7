//! # Redemption Rate
//!
//! ```text
//!        halt      frozen        accepted        frozen      halt
//!   ─────────┼────────────┼─────────────────────┼────────────┼─────────
//!        min_outer    min_inner             max_inner    max_outer
//! ```

use serde::{Deserialize, Serialize};
use shared_types::math::{checked_sum, ratio};
use shared_types::{Dec, Int, MathResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionBounds {
    pub min_outer: Dec,
    pub min_inner: Dec,
    pub max_inner: Dec,
    pub max_outer: Dec,
}

impl RedemptionBounds {
    /// Inner bounds equal to the outer ones.
    pub fn outer_only(min_outer: Dec, max_outer: Dec) -> Self {
        Self {
            min_outer,
            min_inner: min_outer,
            max_inner: max_outer,
            max_outer,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_outer.is_zero() {
            return Err("min_outer must be positive".to_string());
        }
        if !(self.min_outer <= self.min_inner
            && self.min_inner <= self.max_inner
            && self.max_inner <= self.max_outer)
        {
            return Err(format!(
                "bounds out of order: {} <= {} <= {} <= {}",
                self.min_outer, self.min_inner, self.max_inner, self.max_outer
            ));
        }
        Ok(())
    }

    pub fn classify(&self, rate: Dec) -> RateStatus {
        if rate < self.min_outer || rate > self.max_outer {
            RateStatus::OutsideOuter
        } else if rate < self.min_inner || rate > self.max_inner {
            RateStatus::Frozen
        } else {
            RateStatus::Accepted
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateStatus {
    Accepted,
    Frozen,
    OutsideOuter,
}

/// Native value backing a zone's stTokens, split by where it sits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedemptionRateNumerator {
    pub undelegated_balance: Int,
    pub delegated_balance: Int,
    pub in_flight_deposits: Int,
    pub reward_balance: Int,
    pub lsm_balance: Int,
}

impl RedemptionRateNumerator {
    pub fn total(&self) -> MathResult<Int> {
        checked_sum([
            self.undelegated_balance,
            self.delegated_balance,
            self.in_flight_deposits,
            self.reward_balance,
            self.lsm_balance,
        ])
    }

    /// `None` while no stTokens exist.
    pub fn rate(&self, st_supply: Int) -> MathResult<Option<Dec>> {
        if st_supply.is_zero() {
            return Ok(None);
        }
        Ok(Some(ratio(self.total()?, st_supply)?))
    }
}
