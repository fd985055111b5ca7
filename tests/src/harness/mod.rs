//! Simulated host chain, relayer and invariant checks driving the
//! coordinator runtime block by block.

pub mod host;
pub mod invariants;
pub mod network;
pub mod relayer;

pub use host::HostChain;
pub use invariants::{check_all, UnbondingTracker};
pub use network::TestNet;
