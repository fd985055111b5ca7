//! Packet commitments and per-channel sequences kept in the ledger store.
//! A relayer reads [`PacketTransport::pending_packets`] and answers each
//! packet with an ack or a timeout.

use crate::domain::{OutboundPacket, PacketPayload};
use crate::error::{StakeIbcError, StakeIbcResult};
use crate::ports::TransportLayer;
use lsc_icacallbacks::PacketId;
use lsc_ledger_store::{be_u64, path_key, prefix, KvRead, Store};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentPacket {
    pub sequence: u64,
    pub packet: OutboundPacket,
}

impl SentPacket {
    pub fn id(&self) -> PacketId {
        PacketId::new(
            self.packet.port_id.clone(),
            self.packet.channel_id.clone(),
            self.sequence,
        )
    }
}

fn sequence_key(port_id: &str, channel_id: &str) -> Vec<u8> {
    path_key(prefix::TRANSPORT_SEQUENCE, &[port_id, channel_id])
}

fn packet_key(port_id: &str, channel_id: &str, sequence: u64) -> Vec<u8> {
    let mut key = path_key(prefix::TRANSPORT_PACKET, &[port_id, channel_id]);
    key.extend_from_slice(&be_u64(sequence));
    key
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PacketTransport;

impl PacketTransport {
    pub fn new() -> Self {
        Self
    }

    /// Uncleared packets ordered by port, channel and sequence.
    pub fn pending_packets(&self, store: &impl KvRead) -> StakeIbcResult<Vec<SentPacket>> {
        Ok(store
            .values_with_prefix::<SentPacket>(prefix::TRANSPORT_PACKET.as_bytes())?
            .into_iter()
            .map(|(_, packet)| packet)
            .collect())
    }

    pub fn next_sequence(&self, store: &impl KvRead, port_id: &str, channel_id: &str) -> StakeIbcResult<u64> {
        Ok(store
            .get_value::<u64>(&sequence_key(port_id, channel_id))?
            .unwrap_or(1))
    }
}

impl TransportLayer for PacketTransport {
    fn submit(&self, store: &mut Store, packet: OutboundPacket) -> StakeIbcResult<u64> {
        if packet.port_id.is_empty() || packet.channel_id.is_empty() {
            return Err(StakeIbcError::RemoteSubmissionFailed(format!(
                "no open channel on port '{}'",
                packet.port_id
            )));
        }
        match &packet.payload {
            PacketPayload::IcaTx(msgs) if msgs.is_empty() => {
                return Err(StakeIbcError::RemoteSubmissionFailed(
                    "empty interchain account tx".to_string(),
                ));
            }
            PacketPayload::Transfer(transfer) if transfer.amount.is_zero() => {
                return Err(StakeIbcError::RemoteSubmissionFailed(
                    "zero-amount transfer".to_string(),
                ));
            }
            _ => {}
        }

        let sequence = self.next_sequence(store, &packet.port_id, &packet.channel_id)?;
        store.set_value(sequence_key(&packet.port_id, &packet.channel_id), &(sequence + 1))?;
        store.set_value(
            packet_key(&packet.port_id, &packet.channel_id, sequence),
            &SentPacket { sequence, packet },
        )?;
        Ok(sequence)
    }

    fn clear(&self, store: &mut Store, packet: &PacketId) -> StakeIbcResult<()> {
        Ok(store.delete(&packet_key(&packet.port_id, &packet.channel_id, packet.sequence))?)
    }
}
