//! Key layout and value encoding.
//!
//! Integer key components are big-endian `u64` so that byte order equals
//! numeric order. Values are bincode-encoded serde types.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Substore prefixes. No prefix is a prefix of another ledger's keys except
/// the deposit counter, which deposit iteration skips explicitly.
pub mod prefix {
    pub const HOST_ZONE: &str = "HostZone/";
    pub const DEPOSIT_RECORD: &str = "DepositRecord/";
    pub const DEPOSIT_RECORD_COUNT: &str = "DepositRecord/count";
    pub const EPOCH_UNBONDING_RECORD: &str = "EpochUnbondingRecord/";
    pub const USER_REDEMPTION_RECORD: &str = "UserRedemptionRecord/";
    pub const LSM_TOKEN_DEPOSIT: &str = "LSMTokenDeposit/";
    pub const CALLBACK: &str = "Callback/";
    pub const QUERY: &str = "Query/";
    pub const EPOCH_INFO: &str = "EpochInfo/";
    pub const BANK_BALANCE: &str = "Bank/balance/";
    pub const BANK_SUPPLY: &str = "Bank/supply/";
    pub const BANK_DENOM_TRACE: &str = "Bank/denomTrace/";
    pub const MODULE_ACCOUNT: &str = "Account/module/";
    pub const TRANSPORT_SEQUENCE: &str = "Transport/nextSequence/";
    pub const TRANSPORT_PACKET: &str = "Transport/packet/";
    pub const MIGRATION: &str = "Migrations/";
    pub const LAST_BLOCK_HEADER: &str = "Block/lastHeader";
}

/// Big-endian encoding of a `u64` key component.
#[must_use]
pub fn be_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Inverse of [`be_u64`]; `None` unless `bytes` is exactly eight bytes.
#[must_use]
pub fn read_be_u64(bytes: &[u8]) -> Option<u64> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(array))
}

/// `prefix ++ suffix`.
#[must_use]
pub fn key(prefix: &str, suffix: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + suffix.len());
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(suffix);
    out
}

/// `prefix ++ parts[0] ++ "/" ++ parts[1] ++ "/" ...` with a trailing slash,
/// so `channel-1/` never prefixes `channel-10/`.
#[must_use]
pub fn path_key(prefix: &str, parts: &[&str]) -> Vec<u8> {
    let mut out = prefix.as_bytes().to_vec();
    for part in parts {
        out.extend_from_slice(part.as_bytes());
        out.push(b'/');
    }
    out
}

pub fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StoreError::Encode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Decode {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}
