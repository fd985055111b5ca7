//! # Callback Ledger
//!
//! Rows keyed `Callback/<port>/<channel>/<be_u64 sequence>`. One row per
//! outbound packet; the row is taken exactly once, by its ack or its timeout.

use crate::domain::{CallbackData, PacketId};
use crate::error::{CallbackError, CallbackResult};
use lsc_ledger_store::{be_u64, path_key, prefix, KvRead, Store};

fn channel_prefix(port_id: &str, channel_id: &str) -> Vec<u8> {
    path_key(prefix::CALLBACK, &[port_id, channel_id])
}

fn callback_key(packet: &PacketId) -> Vec<u8> {
    let mut key = channel_prefix(&packet.port_id, &packet.channel_id);
    key.extend_from_slice(&be_u64(packet.sequence));
    key
}

/// Registers a row; a second row for the same packet is rejected.
pub fn insert(store: &mut Store, data: &CallbackData) -> CallbackResult<()> {
    let key = callback_key(&data.packet);
    if store.has(&key)? {
        return Err(CallbackError::Duplicate {
            port_id: data.packet.port_id.clone(),
            channel_id: data.packet.channel_id.clone(),
            sequence: data.packet.sequence,
        });
    }
    Ok(store.set_value(key, data)?)
}

pub fn get(store: &impl KvRead, packet: &PacketId) -> CallbackResult<Option<CallbackData>> {
    Ok(store.get_value(&callback_key(packet))?)
}

/// Removes and returns the row, if any.
pub fn take(store: &mut Store, packet: &PacketId) -> CallbackResult<Option<CallbackData>> {
    let key = callback_key(packet);
    let data: Option<CallbackData> = store.get_value(&key)?;
    if data.is_some() {
        store.delete(&key)?;
    }
    Ok(data)
}

/// Every row, ordered by port, channel and sequence.
pub fn all(store: &impl KvRead) -> CallbackResult<Vec<CallbackData>> {
    Ok(store
        .values_with_prefix::<CallbackData>(prefix::CALLBACK.as_bytes())?
        .into_iter()
        .map(|(_, data)| data)
        .collect())
}

/// Rows submitted before `height`.
pub fn iter_stale(store: &impl KvRead, older_than_height: u64) -> CallbackResult<Vec<CallbackData>> {
    Ok(all(store)?
        .into_iter()
        .filter(|data| data.submission_height < older_than_height)
        .collect())
}

/// Lowest outstanding sequence on a channel.
pub fn lowest_pending_sequence(
    store: &impl KvRead,
    port_id: &str,
    channel_id: &str,
) -> CallbackResult<Option<u64>> {
    Ok(store
        .values_with_prefix::<CallbackData>(&channel_prefix(port_id, channel_id))?
        .into_iter()
        .map(|(_, data)| data.packet.sequence)
        .next())
}
