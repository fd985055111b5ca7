use crate::domain::{DepositRecord, DepositRecordStatus};
use crate::error::{RecordsError, RecordsResult};
use lsc_ledger_store::{be_u64, key, prefix, read_be_u64, KvRead, Store};

fn record_key(id: u64) -> Vec<u8> {
    key(prefix::DEPOSIT_RECORD, &be_u64(id))
}

fn count_key() -> Vec<u8> {
    prefix::DEPOSIT_RECORD_COUNT.as_bytes().to_vec()
}

/// Next id to hand out.
pub fn deposit_record_count(store: &impl KvRead) -> RecordsResult<u64> {
    Ok(store.get_value::<u64>(&count_key())?.unwrap_or(0))
}

/// Stores `record` under a freshly allocated id and returns it.
pub fn append_deposit_record(store: &mut Store, mut record: DepositRecord) -> RecordsResult<DepositRecord> {
    let id = deposit_record_count(store)?;
    record.id = id;
    store.set_value(record_key(id), &record)?;
    store.set_value(count_key(), &(id + 1))?;
    Ok(record)
}

pub fn get_deposit_record(store: &impl KvRead, id: u64) -> RecordsResult<Option<DepositRecord>> {
    Ok(store.get_value(&record_key(id))?)
}

pub fn must_get_deposit_record(store: &impl KvRead, id: u64) -> RecordsResult<DepositRecord> {
    get_deposit_record(store, id)?.ok_or(RecordsError::DepositRecordNotFound(id))
}

pub fn set_deposit_record(store: &mut Store, record: &DepositRecord) -> RecordsResult<()> {
    Ok(store.set_value(record_key(record.id), record)?)
}

pub fn remove_deposit_record(store: &mut Store, id: u64) -> RecordsResult<()> {
    Ok(store.delete(&record_key(id))?)
}

/// All records in id order. The counter key shares the prefix and is skipped.
pub fn all_deposit_records(store: &impl KvRead) -> RecordsResult<Vec<DepositRecord>> {
    let prefix_len = prefix::DEPOSIT_RECORD.len();
    let mut records = Vec::new();
    for (raw_key, bytes) in store.scan_prefix(prefix::DEPOSIT_RECORD.as_bytes())? {
        if read_be_u64(&raw_key[prefix_len..]).is_none() {
            continue;
        }
        records.push(lsc_ledger_store::decode(&raw_key, &bytes)?);
    }
    Ok(records)
}

pub fn deposit_records_for_zone(store: &impl KvRead, chain_id: &str) -> RecordsResult<Vec<DepositRecord>> {
    Ok(all_deposit_records(store)?
        .into_iter()
        .filter(|record| record.host_zone_id == chain_id)
        .collect())
}

/// The TRANSFER_QUEUE record collecting a zone's liquid stakes in `epoch`.
pub fn open_transfer_record(
    store: &impl KvRead,
    chain_id: &str,
    epoch: u64,
) -> RecordsResult<Option<DepositRecord>> {
    Ok(deposit_records_for_zone(store, chain_id)?
        .into_iter()
        .find(|record| {
            record.status == DepositRecordStatus::TransferQueue
                && record.deposit_epoch_number == epoch
                && record.source == crate::domain::DepositRecordSource::StrideDeposit
        }))
}
