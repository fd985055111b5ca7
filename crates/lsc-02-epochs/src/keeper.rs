//! # Epoch Keeper
//!
//! Stores [`EpochInfo`]s under `EpochInfo/<identifier>` and advances them from
//! block time. Identifiers are processed in byte order; each identifier is
//! caught up completely, one tick per elapsed duration, before the next.

use crate::domain::{EpochInfo, EpochTick};
use crate::error::{EpochError, EpochResult};
use crate::ports::EpochHooks;
use lsc_ledger_store::{key, prefix, BlockContext, KvRead, Store};
use shared_types::StakeEvent;
use tracing::{debug, info};

fn epoch_key(identifier: &str) -> Vec<u8> {
    key(prefix::EPOCH_INFO, identifier.as_bytes())
}

pub fn get_epoch_info(store: &impl KvRead, identifier: &str) -> EpochResult<Option<EpochInfo>> {
    Ok(store.get_value(&epoch_key(identifier))?)
}

pub fn set_epoch_info(store: &mut Store, info: &EpochInfo) -> EpochResult<()> {
    Ok(store.set_value(epoch_key(&info.identifier), info)?)
}

/// Registers a new stream; rejects duplicates and zero durations.
pub fn add_epoch_info(store: &mut Store, info: EpochInfo) -> EpochResult<()> {
    if info.duration == 0 {
        return Err(EpochError::ZeroDuration(info.identifier));
    }
    if get_epoch_info(store, &info.identifier)?.is_some() {
        return Err(EpochError::Duplicate(info.identifier));
    }
    set_epoch_info(store, &info)
}

pub fn all_epoch_infos(store: &impl KvRead) -> EpochResult<Vec<EpochInfo>> {
    Ok(store
        .values_with_prefix::<EpochInfo>(prefix::EPOCH_INFO.as_bytes())?
        .into_iter()
        .map(|(_, info)| info)
        .collect())
}

/// Current epoch number of a stream.
pub fn current_epoch(store: &impl KvRead, identifier: &str) -> EpochResult<u64> {
    get_epoch_info(store, identifier)?
        .map(|info| info.current_epoch)
        .ok_or_else(|| EpochError::NotFound(identifier.to_string()))
}

/// Advances every stream to the block time, firing `hooks` once per tick.
pub fn begin_block(ctx: &mut BlockContext<'_>, hooks: &dyn EpochHooks) -> EpochResult<Vec<EpochTick>> {
    let now = ctx.block_time_nanos();
    let height = ctx.height();
    let mut ticks = Vec::new();

    for mut info in all_epoch_infos(ctx.store())? {
        if !info.epoch_counting_started {
            if now < info.start_time {
                continue;
            }
            info.epoch_counting_started = true;
            info.current_epoch = 1;
            info.current_epoch_start_time = info.start_time;
            info.current_epoch_start_height = height;
            set_epoch_info(ctx.store_mut(), &info)?;
            debug!(identifier = %info.identifier, "Epoch counting started");
        }

        while now >= info.current_epoch_end() {
            let ended_epoch = info.current_epoch;
            info.current_epoch += 1;
            info.current_epoch_start_time = info.current_epoch_end();
            info.current_epoch_start_height = height;
            set_epoch_info(ctx.store_mut(), &info)?;

            let tick = EpochTick {
                identifier: info.identifier.clone(),
                ended_epoch,
                new_epoch: info.current_epoch,
                new_epoch_start_time: info.current_epoch_start_time,
            };
            info!(
                identifier = %tick.identifier,
                ended_epoch,
                height,
                "Epoch ended"
            );
            ctx.emit(StakeEvent::EpochEnded {
                identifier: tick.identifier.clone(),
                epoch_number: ended_epoch,
            });
            hooks.after_epoch_end(ctx, &tick);
            ticks.push(tick);
        }
    }

    Ok(ticks)
}
