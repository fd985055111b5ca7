use crate::domain::UserRedemptionRecord;
use crate::error::{RecordsError, RecordsResult};
use lsc_ledger_store::{key, prefix, KvRead, Store};

fn record_key(id: &str) -> Vec<u8> {
    key(prefix::USER_REDEMPTION_RECORD, id.as_bytes())
}

pub fn get_user_redemption_record(
    store: &impl KvRead,
    id: &str,
) -> RecordsResult<Option<UserRedemptionRecord>> {
    Ok(store.get_value(&record_key(id))?)
}

pub fn must_get_user_redemption_record(store: &impl KvRead, id: &str) -> RecordsResult<UserRedemptionRecord> {
    get_user_redemption_record(store, id)?
        .ok_or_else(|| RecordsError::UserRedemptionRecordNotFound(id.to_string()))
}

pub fn set_user_redemption_record(store: &mut Store, record: &UserRedemptionRecord) -> RecordsResult<()> {
    Ok(store.set_value(record_key(&record.id), record)?)
}

pub fn remove_user_redemption_record(store: &mut Store, id: &str) -> RecordsResult<()> {
    Ok(store.delete(&record_key(id))?)
}

pub fn all_user_redemption_records(store: &impl KvRead) -> RecordsResult<Vec<UserRedemptionRecord>> {
    Ok(store
        .values_with_prefix::<UserRedemptionRecord>(prefix::USER_REDEMPTION_RECORD.as_bytes())?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}
