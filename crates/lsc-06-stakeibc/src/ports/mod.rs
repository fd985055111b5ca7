//! Ports for the orchestrator.

pub mod outbound;

pub use outbound::{AccountKeeper, Bank, DenomTrace, TransportLayer};
