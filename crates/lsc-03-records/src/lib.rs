//! # Records
//!
//! The ledgers that tie user actions to in-flight remote operations:
//!
//! - **Deposit records**: pooled native deposits moving through
//!   transfer and delegation.
//! - **Epoch unbonding records**: per-epoch redemption batches, one entry per
//!   host zone.
//! - **User redemption records**: each user's share of a batch.
//! - **LSM token deposits**: tokenized shares awaiting detokenization.
//!
//! Status changes go through `transition`, which rejects any edge outside the
//! documented pipeline.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod keeper;

pub use domain::*;
pub use error::{RecordsError, RecordsResult};
