use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, TimestampNanos, NANOS_PER_SECOND, SECONDS_PER_DAY};

/// Drives deposits, delegation, unbonding, rewards and the redemption rate.
pub const STRIDE_EPOCH: &str = "stride_epoch";
/// Drives exit transfers and rebalancing.
pub const DAY_EPOCH: &str = "day";
/// Reserved for rate-limit accounting.
pub const HOUR_EPOCH: &str = "hour";
/// Reserved for inflation.
pub const MINT_EPOCH: &str = "mint";

const HOUR_NANOS: u64 = 3_600 * NANOS_PER_SECOND;

/// Progress of one named epoch stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochInfo {
    pub identifier: String,
    /// Time at which epoch 1 begins.
    pub start_time: TimestampNanos,
    pub duration: u64,
    pub current_epoch: u64,
    pub current_epoch_start_time: TimestampNanos,
    pub epoch_counting_started: bool,
    pub current_epoch_start_height: BlockHeight,
}

impl EpochInfo {
    pub fn new(identifier: impl Into<String>, start_time: TimestampNanos, duration: u64) -> Self {
        Self {
            identifier: identifier.into(),
            start_time,
            duration,
            current_epoch: 0,
            current_epoch_start_time: start_time,
            epoch_counting_started: false,
            current_epoch_start_height: 0,
        }
    }

    /// When the current epoch ends.
    pub fn current_epoch_end(&self) -> TimestampNanos {
        self.current_epoch_start_time.saturating_add(self.duration)
    }

    /// The four streams every coordinator starts with.
    pub fn genesis_epochs(start_time: TimestampNanos) -> Vec<EpochInfo> {
        vec![
            EpochInfo::new(STRIDE_EPOCH, start_time, 6 * HOUR_NANOS),
            EpochInfo::new(DAY_EPOCH, start_time, SECONDS_PER_DAY * NANOS_PER_SECOND),
            EpochInfo::new(HOUR_EPOCH, start_time, HOUR_NANOS),
            EpochInfo::new(MINT_EPOCH, start_time, 6 * HOUR_NANOS),
        ]
    }
}

/// One `AfterEpochEnd` notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochTick {
    pub identifier: String,
    pub ended_epoch: u64,
    /// Epoch that starts with this tick.
    pub new_epoch: u64,
    pub new_epoch_start_time: TimestampNanos,
}

impl EpochTick {
    pub fn is(&self, identifier: &str) -> bool {
        self.identifier == identifier
    }
}
