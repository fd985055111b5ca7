use crate::domain::{EpochUnbondingRecord, HostZoneUnbonding, HostZoneUnbondingStatus};
use crate::error::{RecordsError, RecordsResult};
use lsc_ledger_store::{be_u64, key, prefix, KvRead, Store};

fn record_key(epoch: u64) -> Vec<u8> {
    key(prefix::EPOCH_UNBONDING_RECORD, &be_u64(epoch))
}

pub fn get_epoch_unbonding_record(
    store: &impl KvRead,
    epoch: u64,
) -> RecordsResult<Option<EpochUnbondingRecord>> {
    Ok(store.get_value(&record_key(epoch))?)
}

pub fn set_epoch_unbonding_record(store: &mut Store, record: &EpochUnbondingRecord) -> RecordsResult<()> {
    for hzu in &record.host_zone_unbondings {
        hzu.validate()?;
    }
    Ok(store.set_value(record_key(record.epoch_number), record)?)
}

pub fn remove_epoch_unbonding_record(store: &mut Store, epoch: u64) -> RecordsResult<()> {
    Ok(store.delete(&record_key(epoch))?)
}

/// Records in ascending epoch order.
pub fn all_epoch_unbonding_records(store: &impl KvRead) -> RecordsResult<Vec<EpochUnbondingRecord>> {
    Ok(store
        .values_with_prefix::<EpochUnbondingRecord>(prefix::EPOCH_UNBONDING_RECORD.as_bytes())?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Opens the record for `epoch` with an empty UNBONDING_QUEUE entry per zone.
/// Existing entries are kept.
pub fn create_epoch_unbonding_record(
    store: &mut Store,
    epoch: u64,
    zones: &[(String, String)],
) -> RecordsResult<EpochUnbondingRecord> {
    let mut record = get_epoch_unbonding_record(store, epoch)?
        .unwrap_or_else(|| EpochUnbondingRecord::new(epoch));
    for (chain_id, denom) in zones {
        if record.host_zone_unbonding(chain_id).is_none() {
            record.upsert(HostZoneUnbonding::new(chain_id.clone(), denom.clone()));
        }
    }
    set_epoch_unbonding_record(store, &record)?;
    Ok(record)
}

pub fn get_host_zone_unbonding(
    store: &impl KvRead,
    epoch: u64,
    chain_id: &str,
) -> RecordsResult<HostZoneUnbonding> {
    let record = get_epoch_unbonding_record(store, epoch)?
        .ok_or(RecordsError::EpochUnbondingRecordNotFound(epoch))?;
    record
        .host_zone_unbonding(chain_id)
        .cloned()
        .ok_or_else(|| RecordsError::HostZoneUnbondingNotFound {
            epoch,
            chain_id: chain_id.to_string(),
        })
}

/// Writes `unbonding` into the epoch record, creating the record if needed.
pub fn set_host_zone_unbonding(
    store: &mut Store,
    epoch: u64,
    unbonding: HostZoneUnbonding,
) -> RecordsResult<()> {
    let mut record = get_epoch_unbonding_record(store, epoch)?
        .unwrap_or_else(|| EpochUnbondingRecord::new(epoch));
    record.upsert(unbonding);
    set_epoch_unbonding_record(store, &record)
}

/// Deletes a zone's entry, and the whole record once it is empty.
pub fn remove_host_zone_unbonding(store: &mut Store, epoch: u64, chain_id: &str) -> RecordsResult<()> {
    let Some(mut record) = get_epoch_unbonding_record(store, epoch)? else {
        return Ok(());
    };
    record.remove(chain_id);
    if record.host_zone_unbondings.is_empty() {
        remove_epoch_unbonding_record(store, epoch)
    } else {
        set_epoch_unbonding_record(store, &record)
    }
}

/// Moves the listed entries to `status`, validating each edge.
pub fn set_host_zone_unbonding_status(
    store: &mut Store,
    chain_id: &str,
    epochs: &[u64],
    status: HostZoneUnbondingStatus,
) -> RecordsResult<()> {
    for epoch in epochs {
        let mut unbonding = get_host_zone_unbonding(store, *epoch, chain_id)?;
        unbonding.transition(status)?;
        set_host_zone_unbonding(store, *epoch, unbonding)?;
    }
    Ok(())
}

/// `(epoch, unbonding)` pairs for one zone in one status, ascending by epoch.
pub fn host_zone_unbondings_with_status(
    store: &impl KvRead,
    chain_id: &str,
    status: HostZoneUnbondingStatus,
) -> RecordsResult<Vec<(u64, HostZoneUnbonding)>> {
    Ok(all_epoch_unbonding_records(store)?
        .into_iter()
        .filter_map(|record| {
            let epoch = record.epoch_number;
            record
                .host_zone_unbondings
                .into_iter()
                .find(|hzu| hzu.host_zone_id == chain_id && hzu.status == status)
                .map(|hzu| (epoch, hzu))
        })
        .collect())
}

/// Drops fully claimed entries and then empty records. Returns removed epochs.
pub fn prune_claimed_unbondings(store: &mut Store) -> RecordsResult<Vec<u64>> {
    let mut removed = Vec::new();
    for mut record in all_epoch_unbonding_records(store)? {
        let before = record.host_zone_unbondings.len();
        record.host_zone_unbondings.retain(|hzu| {
            !(hzu.status == HostZoneUnbondingStatus::Claimable
                && hzu.user_redemption_records.is_empty())
        });
        if record.host_zone_unbondings.is_empty() {
            remove_epoch_unbonding_record(store, record.epoch_number)?;
            removed.push(record.epoch_number);
        } else if record.host_zone_unbondings.len() != before {
            set_epoch_unbonding_record(store, &record)?;
        }
    }
    Ok(removed)
}
