//! Pure orchestrator types and rules. Nothing here touches the store.

pub mod allocation;
pub mod callbacks;
pub mod host_zone;
pub mod msgs;
pub mod queries;
pub mod redemption_rate;
pub mod remote;
pub mod validator;

pub use allocation::{allocate_delegation, allocate_undelegation, plan_rebalance, Rebalancing, ValidatorAmount};
pub use callbacks::CallbackArgs;
pub use host_zone::{HostZone, IcaAccount, IcaAccountType};
pub use msgs::*;
pub use queries::{HostQueryResult, QueryContext};
pub use redemption_rate::{RateStatus, RedemptionBounds, RedemptionRateNumerator};
pub use remote::{MsgResponse, OutboundPacket, PacketPayload, RemoteMsg, TransferPacket};
pub use validator::Validator;
