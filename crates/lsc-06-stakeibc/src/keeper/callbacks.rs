//! # Callback Dispatch
//!
//! Every ack or timeout resolves exactly one callback row:
//!
//! ```text
//!  ack bytes ──► AckResponse ──┐
//!  timeout ────► AckResponse ──┼─► take row ─► decode args ─► branch(handler)
//!                              │       │ none                     │ Internal
//!                              │       ▼                          ▼
//!                              │  CallbackMissing            halt zone
//! ```
//!
//! The row is consumed before the handler runs, so a handler error never
//! lets the same packet resolve twice.

use super::StakeIbcKeeper;
use crate::domain::CallbackArgs;
use crate::error::StakeIbcResult;
use lsc_icacallbacks::{AckResponse, PacketId};
use lsc_ledger_store::BlockContext;
use shared_types::{CallbackOutcome, StakeEvent};
use tracing::{debug, error, warn};

impl StakeIbcKeeper {
    /// Resolves the callback of an acknowledged packet. A malformed ack is
    /// handled as a failure.
    pub fn on_acknowledgement(&self, ctx: &mut BlockContext<'_>, packet: &PacketId, ack: &[u8]) -> StakeIbcResult<()> {
        let response = AckResponse::from_ack_bytes(ack).unwrap_or_else(|err| {
            warn!(packet = %packet, error = %err, "Malformed acknowledgement");
            AckResponse {
                status: CallbackOutcome::Failure,
                msg_responses: Vec::new(),
                error: Some(err.to_string()),
            }
        });
        self.resolve_packet(ctx, packet, response)
    }

    pub fn on_timeout(&self, ctx: &mut BlockContext<'_>, packet: &PacketId) -> StakeIbcResult<()> {
        self.resolve_packet(ctx, packet, AckResponse::timeout())
    }

    fn resolve_packet(&self, ctx: &mut BlockContext<'_>, packet: &PacketId, ack: AckResponse) -> StakeIbcResult<()> {
        self.transport.clear(ctx.store_mut(), packet)?;

        if let Some(lowest) =
            lsc_icacallbacks::keeper::lowest_pending_sequence(ctx.store(), &packet.port_id, &packet.channel_id)?
        {
            if lowest != packet.sequence {
                warn!(packet = %packet, lowest, "Acknowledgement out of sequence order");
            }
        }

        let Some(row) = lsc_icacallbacks::keeper::take(ctx.store_mut(), packet)? else {
            warn!(packet = %packet, "No callback registered for packet");
            ctx.emit(StakeEvent::CallbackMissing {
                port_id: packet.port_id.clone(),
                channel_id: packet.channel_id.clone(),
                sequence: packet.sequence,
            });
            return Ok(());
        };

        let args = match CallbackArgs::decode(&row.callback_id, &row.callback_args) {
            Ok(args) => args,
            Err(err) => {
                error!(packet = %packet, callback_id = %row.callback_id, error = %err, "Callback arguments undecodable");
                return Ok(());
            }
        };
        let chain_id = args.chain_id().to_string();

        if let Err(err) = ctx.branch(|ctx| self.dispatch_callback(ctx, &args, &ack)) {
            error!(
                chain_id = %chain_id,
                callback_id = %row.callback_id,
                packet = %packet,
                error = %err,
                "Callback handler failed"
            );
            if err.is_invariant_violation() {
                self.halt_host_zone(ctx, &chain_id, &err.to_string())?;
            }
        }

        debug!(chain_id = %chain_id, callback_id = %row.callback_id, outcome = %ack.status, "Callback resolved");
        ctx.emit(StakeEvent::CallbackResolved {
            chain_id,
            callback_id: row.callback_id,
            sequence: packet.sequence,
            outcome: ack.status,
        });
        Ok(())
    }

    fn dispatch_callback(&self, ctx: &mut BlockContext<'_>, args: &CallbackArgs, ack: &AckResponse) -> StakeIbcResult<()> {
        match args {
            CallbackArgs::NativeTransfer {
                chain_id,
                deposit_record_id,
                ..
            } => self.on_native_transfer(ctx, chain_id, *deposit_record_id, ack),
            CallbackArgs::Delegate {
                chain_id,
                deposit_record_id,
                splits,
            } => self.on_delegate(ctx, chain_id, *deposit_record_id, splits, ack),
            CallbackArgs::Undelegate {
                chain_id,
                epoch,
                splits,
                st_tokens_to_burn,
            } => self.on_undelegate(ctx, chain_id, *epoch, splits, *st_tokens_to_burn, ack),
            CallbackArgs::Claim { chain_id } => self.on_claim(ctx, chain_id, ack),
            CallbackArgs::Reinvest {
                chain_id,
                reinvest_amount,
                fee_amount,
            } => self.on_reinvest(ctx, chain_id, *reinvest_amount, *fee_amount, ack),
            CallbackArgs::Rebalance { chain_id, rebalancings } => self.on_rebalance(ctx, chain_id, rebalancings, ack),
            CallbackArgs::Redemption { chain_id, epochs } => self.on_redemption(ctx, chain_id, epochs, ack),
            CallbackArgs::ClaimUndelegation {
                chain_id,
                user_redemption_record_id,
                epoch,
            } => self.on_claim_undelegation(ctx, chain_id, user_redemption_record_id, *epoch, ack),
            CallbackArgs::LsmTransfer { chain_id, denom } => self.on_lsm_transfer(ctx, chain_id, denom, ack),
            CallbackArgs::Detokenize { chain_id, denom } => self.on_detokenize(ctx, chain_id, denom, ack),
        }
    }
}
