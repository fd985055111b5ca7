//! # Core Entities
//!
//! Coins, block time units and denom helpers shared by all subsystems.

use crate::math::Int;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height.
pub type BlockHeight = u64;

/// Unix time in nanoseconds.
pub type TimestampNanos = u64;

/// Nanoseconds per second.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Seconds per day.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Whole seconds of a nanosecond timestamp.
#[must_use]
pub fn nanos_to_secs(nanos: TimestampNanos) -> u64 {
    nanos / NANOS_PER_SECOND
}

/// Prefix of every derivative denom.
pub const ST_DENOM_PREFIX: &str = "st";

/// Derivative denom for a host denom (`uatom` -> `stuatom`).
#[must_use]
pub fn st_denom(host_denom: &str) -> String {
    format!("{ST_DENOM_PREFIX}{host_denom}")
}

/// An amount of a single denom.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount.
    pub amount: Int,
}

impl Coin {
    pub fn new(amount: impl Into<Int>, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
