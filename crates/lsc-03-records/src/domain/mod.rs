mod deposit;
mod lsm;
mod redemption;
mod unbonding;

pub use deposit::{DepositRecord, DepositRecordSource, DepositRecordStatus};
pub use lsm::{LsmDepositStatus, LsmTokenDeposit};
pub use redemption::{user_redemption_record_id, UserRedemptionRecord};
pub use unbonding::{EpochUnbondingRecord, HostZoneUnbonding, HostZoneUnbondingStatus};
