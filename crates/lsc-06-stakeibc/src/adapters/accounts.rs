//! Bech32 address codec and module accounts derived from their names.

use crate::error::{StakeIbcError, StakeIbcResult};
use crate::ports::AccountKeeper;
use bech32::{Bech32, Hrp};
use lsc_ledger_store::{key, prefix, KvRead, Store};
use sha2::{Digest, Sha256};

/// Encodes `data` under `hrp`.
pub fn encode_address(hrp: &str, data: &[u8]) -> StakeIbcResult<String> {
    let hrp = Hrp::parse(hrp).map_err(|e| StakeIbcError::InvalidAddress {
        address: String::new(),
        expected_prefix: hrp.to_string(),
        reason: e.to_string(),
    })?;
    bech32::encode::<Bech32>(hrp, data).map_err(|e| StakeIbcError::Internal(e.to_string()))
}

/// 20-byte address of a module account: `sha256(name)[..20]`.
pub fn module_address(hrp: &str, name: &str) -> StakeIbcResult<String> {
    let digest = Sha256::digest(name.as_bytes());
    encode_address(hrp, &digest[..20])
}

fn module_key(name: &str) -> Vec<u8> {
    key(prefix::MODULE_ACCOUNT, name.as_bytes())
}

#[derive(Debug, Clone)]
pub struct Bech32Accounts {
    local_prefix: String,
}

impl Bech32Accounts {
    pub fn new(local_prefix: impl Into<String>) -> Self {
        Self {
            local_prefix: local_prefix.into(),
        }
    }

    pub fn local_prefix(&self) -> &str {
        &self.local_prefix
    }
}

impl AccountKeeper for Bech32Accounts {
    fn create_module_account(&self, store: &mut Store, name: &str) -> StakeIbcResult<String> {
        if let Some(existing) = self.resolve(store, name)? {
            return Ok(existing);
        }
        let address = module_address(&self.local_prefix, name)?;
        store.set_value(module_key(name), &address)?;
        Ok(address)
    }

    fn resolve(&self, store: &Store, name: &str) -> StakeIbcResult<Option<String>> {
        Ok(store.get_value(&module_key(name))?)
    }

    fn parse_bech32(&self, address: &str, expected_prefix: &str) -> StakeIbcResult<String> {
        let invalid = |reason: String| StakeIbcError::InvalidAddress {
            address: address.to_string(),
            expected_prefix: expected_prefix.to_string(),
            reason,
        };
        let (hrp, data) = bech32::decode(address).map_err(|e| invalid(e.to_string()))?;
        if !hrp.to_string().eq_ignore_ascii_case(expected_prefix) {
            return Err(invalid(format!("prefix is {hrp}")));
        }
        if data.is_empty() {
            return Err(invalid("empty payload".to_string()));
        }
        Ok(address.to_lowercase())
    }
}
