//! # Orchestrator Keeper
//!
//! [`StakeIbcKeeper`] owns the ports and implements every orchestrator
//! operation over a [`BlockContext`]:
//!
//! ```text
//!  user msgs ──► liquid_stake / redeem_stake / claim / lsm_liquid_stake
//!  epoch ticks ─► stride: transfer → lsm → delegate → undelegate → rewards
//!                         → queries → redemption rate
//!                 day:    exit transfers → rebalance
//!  acks ───────► callbacks::dispatch ──► typed handler
//!  query resp ─► icqueries::dispatch ──► typed handler
//! ```
//!
//! Remote submissions always go through [`StakeIbcKeeper::submit_ica_tx`] or
//! [`StakeIbcKeeper::submit_transfer`], which register the callback row in
//! the same store layer as the packet.

mod callbacks;
mod claim;
mod deposits;
mod epoch_hooks;
mod governance;
mod host_zone;
mod icqueries;
mod invariants;
mod liquid_stake;
mod lsm;
mod rebalance;
mod redeem_stake;
mod redemption_rate;
mod rewards;
mod unbonding;

#[cfg(test)]
pub(crate) mod test_utils;

pub use host_zone::{
    all_host_zones, get_host_zone, host_zone_by_host_denom, host_zone_by_transfer_channel, must_get_host_zone,
    set_host_zone,
};
pub use invariants::halt_matches_redemption_rate;

use crate::config::Params;
use crate::domain::{
    CallbackArgs, HostZone, IcaAccountType, OutboundPacket, PacketPayload, RemoteMsg, TransferPacket, UserMsg,
};
use crate::error::{StakeIbcError, StakeIbcResult};
use crate::ports::{AccountKeeper, Bank, TransportLayer};
use lsc_epochs::STRIDE_EPOCH;
use lsc_icacallbacks::{CallbackData, PacketId};
use lsc_ledger_store::{BlockContext, KvRead};
use shared_types::StakeEvent;
use std::sync::Arc;
use tracing::debug;

/// Module account escrowing outbound transfers until they are acknowledged.
pub const TRANSFER_ESCROW_ACCOUNT: &str = "transfer";

/// Local transfer port.
pub const TRANSFER_PORT: &str = "transfer";

fn closed_account(zone: &HostZone, account: IcaAccountType) -> StakeIbcError {
    StakeIbcError::RemoteSubmissionFailed(format!(
        "{} {} account is not open",
        zone.chain_id,
        account.as_str()
    ))
}

pub struct StakeIbcKeeper {
    params: Params,
    bank: Arc<dyn Bank>,
    accounts: Arc<dyn AccountKeeper>,
    transport: Arc<dyn TransportLayer>,
}

impl StakeIbcKeeper {
    pub fn new(
        params: Params,
        bank: Arc<dyn Bank>,
        accounts: Arc<dyn AccountKeeper>,
        transport: Arc<dyn TransportLayer>,
    ) -> Self {
        Self {
            params,
            bank,
            accounts,
            transport,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn bank(&self) -> &dyn Bank {
        self.bank.as_ref()
    }

    pub fn accounts(&self) -> &dyn AccountKeeper {
        self.accounts.as_ref()
    }

    /// Routes a user message to its handler.
    pub fn handle_user(&self, ctx: &mut BlockContext<'_>, msg: &UserMsg) -> StakeIbcResult<()> {
        match msg {
            UserMsg::LiquidStake(msg) => self.liquid_stake(ctx, msg).map(|_| ()),
            UserMsg::RedeemStake(msg) => self.redeem_stake(ctx, msg).map(|_| ()),
            UserMsg::ClaimUndelegatedTokens(msg) => self.claim_undelegated_tokens(ctx, msg).map(|_| ()),
            UserMsg::LsmLiquidStake(msg) => self.lsm_liquid_stake(ctx, msg).map(|_| ()),
        }
    }

    /// Current `stride_epoch` number.
    pub fn current_stride_epoch(&self, store: &impl KvRead) -> StakeIbcResult<u64> {
        Ok(lsc_epochs::current_epoch(store, STRIDE_EPOCH)?)
    }

    fn transfer_escrow_address(&self, ctx: &mut BlockContext<'_>) -> StakeIbcResult<String> {
        self.accounts
            .create_module_account(ctx.store_mut(), TRANSFER_ESCROW_ACCOUNT)
    }

    /// Address of an open interchain account, or `RemoteSubmissionFailed`.
    fn ica_address(zone: &HostZone, account: IcaAccountType) -> StakeIbcResult<String> {
        zone.ica(account)
            .map(|ica| ica.address.clone())
            .ok_or_else(|| closed_account(zone, account))
    }

    /// Sends `msgs` as one tx from the zone's `account` and registers `args`.
    pub(crate) fn submit_ica_tx(
        &self,
        ctx: &mut BlockContext<'_>,
        zone: &HostZone,
        account: IcaAccountType,
        msgs: Vec<RemoteMsg>,
        args: CallbackArgs,
    ) -> StakeIbcResult<u64> {
        let ica = zone.ica(account).ok_or_else(|| closed_account(zone, account))?;
        let packet = OutboundPacket {
            connection_id: zone.connection_id.clone(),
            port_id: ica.port_id.clone(),
            channel_id: ica.channel_id.clone(),
            payload: PacketPayload::IcaTx(msgs),
            timeout_nanos: ctx
                .block_time_nanos()
                .saturating_add(self.params.ica_timeout_nanos),
        };
        self.submit_packet(ctx, &zone.chain_id, packet, args)
    }

    /// Sends local tokens to a host address over the zone's transfer channel.
    pub(crate) fn submit_transfer(
        &self,
        ctx: &mut BlockContext<'_>,
        zone: &HostZone,
        transfer: TransferPacket,
        args: CallbackArgs,
    ) -> StakeIbcResult<u64> {
        let packet = OutboundPacket {
            connection_id: zone.connection_id.clone(),
            port_id: TRANSFER_PORT.to_string(),
            channel_id: zone.transfer_channel_id.clone(),
            payload: PacketPayload::Transfer(transfer),
            timeout_nanos: ctx
                .block_time_nanos()
                .saturating_add(self.params.ibc_transfer_timeout_nanos),
        };
        self.submit_packet(ctx, &zone.chain_id, packet, args)
    }

    fn submit_packet(
        &self,
        ctx: &mut BlockContext<'_>,
        chain_id: &str,
        packet: OutboundPacket,
        args: CallbackArgs,
    ) -> StakeIbcResult<u64> {
        let messages = match &packet.payload {
            PacketPayload::IcaTx(msgs) => msgs.len(),
            PacketPayload::Transfer(_) => 1,
        };
        let (port_id, channel_id) = (packet.port_id.clone(), packet.channel_id.clone());
        let sequence = self.transport.submit(ctx.store_mut(), packet)?;

        let row = CallbackData {
            packet: PacketId::new(port_id.clone(), channel_id.clone(), sequence),
            callback_id: args.callback_id().to_string(),
            callback_args: args.encode()?,
            submission_height: ctx.height(),
        };
        lsc_icacallbacks::keeper::insert(ctx.store_mut(), &row)?;

        debug!(
            chain_id,
            callback_id = args.callback_id(),
            port = %port_id,
            channel = %channel_id,
            sequence,
            "Remote call submitted"
        );
        ctx.emit(StakeEvent::RemoteCallSubmitted {
            chain_id: chain_id.to_string(),
            callback_id: args.callback_id().to_string(),
            port_id,
            channel_id,
            sequence,
            messages,
        });
        Ok(sequence)
    }
}
