//! # Epochs
//!
//! Named epoch streams (`stride_epoch`, `day`, `hour`, `mint`) advanced by
//! block time. When `block_time >= current_epoch_start + duration` the stream
//! increments and `AfterEpochEnd(identifier, ended_epoch)` reaches the
//! registered [`EpochHooks`] inside the same block. Several elapsed durations
//! in one block produce one tick each; none are dropped.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod keeper;
pub mod ports;

pub use domain::{EpochInfo, EpochTick, DAY_EPOCH, HOUR_EPOCH, MINT_EPOCH, STRIDE_EPOCH};
pub use error::{EpochError, EpochResult};
pub use keeper::{
    add_epoch_info, all_epoch_infos, begin_block, current_epoch, get_epoch_info, set_epoch_info,
};
pub use ports::{EpochHooks, NoopHooks};
