//! Outbound ports of the ledger store.

mod backend;

pub use backend::{KvBackend, WriteBatch};
