//! Data-access functions, one module per ledger. Each ledger owns its own
//! key prefix and never reads another's.

pub mod deposit;
pub mod lsm;
pub mod redemption;
pub mod unbonding;
