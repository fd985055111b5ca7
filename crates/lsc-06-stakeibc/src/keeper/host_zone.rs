//! Host zone rows keyed `HostZone/<chain_id>`; iteration is in byte order
//! of chain id.

use super::StakeIbcKeeper;
use crate::domain::HostZone;
use crate::error::{StakeIbcError, StakeIbcResult};
use lsc_ledger_store::{key, prefix, BlockContext, KvRead, Store};
use shared_types::StakeEvent;
use tracing::error;

fn zone_key(chain_id: &str) -> Vec<u8> {
    key(prefix::HOST_ZONE, chain_id.as_bytes())
}

pub fn get_host_zone(store: &impl KvRead, chain_id: &str) -> StakeIbcResult<Option<HostZone>> {
    Ok(store.get_value(&zone_key(chain_id))?)
}

pub fn must_get_host_zone(store: &impl KvRead, chain_id: &str) -> StakeIbcResult<HostZone> {
    get_host_zone(store, chain_id)?.ok_or_else(|| StakeIbcError::HostZoneNotFound(chain_id.to_string()))
}

pub fn set_host_zone(store: &mut Store, zone: &HostZone) -> StakeIbcResult<()> {
    Ok(store.set_value(zone_key(&zone.chain_id), zone)?)
}

pub fn all_host_zones(store: &impl KvRead) -> StakeIbcResult<Vec<HostZone>> {
    Ok(store
        .values_with_prefix::<HostZone>(prefix::HOST_ZONE.as_bytes())?
        .into_iter()
        .map(|(_, zone)| zone)
        .collect())
}

pub fn host_zone_by_host_denom(store: &impl KvRead, host_denom: &str) -> StakeIbcResult<HostZone> {
    all_host_zones(store)?
        .into_iter()
        .find(|zone| zone.host_denom == host_denom)
        .ok_or_else(|| StakeIbcError::HostZoneNotFound(format!("no zone for denom {host_denom}")))
}

pub fn host_zone_by_transfer_channel(store: &impl KvRead, channel_id: &str) -> StakeIbcResult<Option<HostZone>> {
    Ok(all_host_zones(store)?
        .into_iter()
        .find(|zone| zone.transfer_channel_id == channel_id))
}

/// Rejects user actions on halted or frozen zones.
pub(crate) fn ensure_accepting_user_actions(zone: &HostZone) -> StakeIbcResult<()> {
    if zone.halted {
        return Err(StakeIbcError::HostZoneHalted(zone.chain_id.clone()));
    }
    if zone.redemption_rate_frozen {
        return Err(StakeIbcError::RedemptionRateOutOfBounds {
            chain_id: zone.chain_id.clone(),
            rate: zone.redemption_rate,
        });
    }
    Ok(())
}

impl StakeIbcKeeper {
    /// Sets `halted`; a no-op for unknown or already halted zones.
    pub fn halt_host_zone(&self, ctx: &mut BlockContext<'_>, chain_id: &str, reason: &str) -> StakeIbcResult<()> {
        let Some(mut zone) = get_host_zone(ctx.store(), chain_id)? else {
            return Ok(());
        };
        if zone.halted {
            return Ok(());
        }
        zone.halted = true;
        set_host_zone(ctx.store_mut(), &zone)?;
        error!(chain_id, reason, "Host zone halted");
        ctx.emit(StakeEvent::HostZoneHalted {
            chain_id: chain_id.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}
