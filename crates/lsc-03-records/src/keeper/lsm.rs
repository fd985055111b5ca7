use crate::domain::LsmTokenDeposit;
use crate::error::{RecordsError, RecordsResult};
use lsc_ledger_store::{path_key, prefix, KvRead, Store};

fn deposit_key(chain_id: &str, denom: &str) -> Vec<u8> {
    path_key(prefix::LSM_TOKEN_DEPOSIT, &[chain_id, denom])
}

pub fn get_lsm_deposit(
    store: &impl KvRead,
    chain_id: &str,
    denom: &str,
) -> RecordsResult<Option<LsmTokenDeposit>> {
    Ok(store.get_value(&deposit_key(chain_id, denom))?)
}

pub fn must_get_lsm_deposit(store: &impl KvRead, chain_id: &str, denom: &str) -> RecordsResult<LsmTokenDeposit> {
    get_lsm_deposit(store, chain_id, denom)?.ok_or_else(|| RecordsError::LsmDepositNotFound {
        chain_id: chain_id.to_string(),
        denom: denom.to_string(),
    })
}

pub fn set_lsm_deposit(store: &mut Store, deposit: &LsmTokenDeposit) -> RecordsResult<()> {
    Ok(store.set_value(deposit_key(&deposit.chain_id, &deposit.denom), deposit)?)
}

pub fn remove_lsm_deposit(store: &mut Store, chain_id: &str, denom: &str) -> RecordsResult<()> {
    Ok(store.delete(&deposit_key(chain_id, denom))?)
}

pub fn lsm_deposits_for_zone(store: &impl KvRead, chain_id: &str) -> RecordsResult<Vec<LsmTokenDeposit>> {
    Ok(store
        .values_with_prefix::<LsmTokenDeposit>(&path_key(prefix::LSM_TOKEN_DEPOSIT, &[chain_id]))?
        .into_iter()
        .map(|(_, deposit)| deposit)
        .collect())
}
