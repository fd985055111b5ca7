use serde::{Deserialize, Serialize};
use shared_types::Int;

/// `"{epoch}.{host_zone_id}.{user}"`.
pub fn user_redemption_record_id(epoch: u64, host_zone_id: &str, user: &str) -> String {
    format!("{epoch}.{host_zone_id}.{user}")
}

/// One user's share of a host zone unbonding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRedemptionRecord {
    pub id: String,
    pub sender: String,
    pub receiver: String,
    pub st_token_amount: Int,
    pub native_token_amount: Int,
    pub denom: String,
    pub host_zone_id: String,
    pub epoch_number: u64,
    pub claim_is_pending: bool,
}
