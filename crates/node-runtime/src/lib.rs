//! # Node Runtime Library
//!
//! The block executor of the liquid staking coordinator, exposed as a library
//! so the scenario suite can drive it directly. The `lsc-node` binary wraps
//! it with a local block clock.
//!
//! ## Block Lifecycle
//!
//! 1. Begin a block layer on the ledger store
//! 2. Tick epoch streams; the orchestrator hooks run inside the same block
//! 3. Deliver each [`Tx`] in its own branch; a rejected tx rolls back alone
//! 4. Sweep invariants and halt zones whose delegation totals disagree
//! 5. Commit, refresh the read snapshot
//! 6. Publish committed events on the shared bus and record metrics

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod error;
pub mod migrations;
pub mod runtime;
pub mod tx;

pub use config::NodeConfig;
pub use error::{RuntimeError, RuntimeResult};
pub use migrations::{applied_at, MigrationFn, MigrationRegistry};
pub use runtime::{BlockOutcome, NodeRuntime, SnapshotReader};
pub use tx::{Tx, TxOutcome, TxResult};
