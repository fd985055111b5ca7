//! # ICA Callbacks
//!
//! In-flight remote-call descriptors keyed by `(port, channel, sequence)`.
//!
//! ```text
//! submit ──► insert(row) ──► [packet in flight] ──► ack / timeout
//!                                                      │
//!                               take(row) ◄────────────┘
//!                                   │
//!                                   ▼
//!                         typed handler (orchestrator)
//! ```
//!
//! At most one row exists per packet, and every packet that returned a
//! sequence has its row before the block commits.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod error;
pub mod keeper;

pub use domain::{AckResponse, Acknowledgement, CallbackData, PacketId};
pub use error::{CallbackError, CallbackResult};
