use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Store query against the host's staking module.
pub const STAKING_STORE_QUERY: &str = "store/staking/key";
/// Store query against the host's bank module.
pub const BANK_STORE_QUERY: &str = "store/bank/key";

/// An outstanding proof-backed read of host state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub id: String,
    pub chain_id: String,
    pub connection_id: String,
    pub query_type: String,
    pub request_data: Vec<u8>,
    pub callback_id: String,
    /// Handler context, opaque to this ledger.
    pub callback_data: Vec<u8>,
    /// Absolute deadline in block-time nanos.
    pub ttl: u64,
    pub submission_height: u64,
}

impl Query {
    pub fn is_expired(&self, now_nanos: u64) -> bool {
        now_nanos > self.ttl
    }
}

/// What a submitter asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub chain_id: String,
    pub connection_id: String,
    pub query_type: String,
    pub request_data: Vec<u8>,
    pub callback_id: String,
    pub callback_data: Vec<u8>,
    pub timeout_nanos: u64,
}

/// Hex SHA-256 over the identifying fields and submission height.
pub fn query_id(request: &QueryRequest, submission_height: u64) -> String {
    let mut hasher = Sha256::new();
    for part in [
        request.chain_id.as_bytes(),
        request.connection_id.as_bytes(),
        request.query_type.as_bytes(),
        request.request_data.as_slice(),
        request.callback_id.as_bytes(),
    ] {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.update(submission_height.to_be_bytes());
    hex::encode(hasher.finalize())
}
