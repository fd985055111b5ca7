//! Multi-epoch scenarios across stake, delegation, unbonding and claims.

pub mod events;
pub mod properties;
pub mod scenarios;
