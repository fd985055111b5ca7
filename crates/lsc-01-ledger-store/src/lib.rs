//! # Ledger Store
//!
//! Typed, ordered key/value substores with a transactional scope per block.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     BlockContext                        │
//! │   header (height, time) · event buffer · branch(f)      │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ &mut
//! ┌───────────────────────────▼─────────────────────────────┐
//! │                 Store (write layers)                    │
//! │      begin / commit / rollback · merged prefix scan     │
//! └───────────────────────────┬─────────────────────────────┘
//!                             │ KvBackend port
//! ┌───────────────────────────▼─────────────────────────────┐
//! │               MemoryBackend (BTreeMap)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every ledger owns a distinct key prefix (see [`codec::prefix`]); integer
//! key components are big-endian so iteration order equals numeric order.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod codec;
pub mod context;
pub mod error;
pub mod ports;
pub mod store;

pub use adapters::MemoryBackend;
pub use codec::{be_u64, decode, encode, key, path_key, prefix, read_be_u64};
pub use context::{BlockContext, BlockHeader};
pub use error::{StoreError, StoreResult};
pub use ports::{KvBackend, WriteBatch};
pub use store::{KvRead, Snapshot, Store};
