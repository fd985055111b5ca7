//! # Relayer
//!
//! Turns committed coordinator state into the next block's transactions:
//!
//! ```text
//!  pending packets ──► past deadline? ── yes ─► Tx::Timeout
//!                            │ no
//!                            ▼
//!                      host.execute ── Ok ──► Tx::Ack(Result)
//!                                    └─ Err ─► Tx::Ack(Error)
//!  pending queries ──► read host state ─────► Tx::QueryResponse
//! ```
//!
//! Packets are relayed before queries, so a query answered in the same
//! round observes the effects of the packets relayed with it.

use super::host::HostChain;
use lsc_icacallbacks::Acknowledgement;
use lsc_interchain_query::Query;
use lsc_ledger_store::KvRead;
use lsc_node_runtime::Tx;
use lsc_stakeibc::domain::queries::{DELEGATOR_SHARES, VALIDATOR_EXCHANGE_RATE, WITHDRAWAL_BALANCE};
use lsc_stakeibc::{HostQueryResult, SentPacket};
use shared_types::nanos_to_secs;

/// Acknowledgement bytes for a host execution result.
pub fn ack_bytes(result: &Result<Vec<lsc_stakeibc::MsgResponse>, String>) -> Vec<u8> {
    match result {
        Ok(responses) => Acknowledgement::Result(
            responses
                .iter()
                .map(|response| response.encode().unwrap_or_default())
                .collect(),
        )
        .encode(),
        Err(reason) => Acknowledgement::Error(reason.clone()).encode(),
    }
}

/// Executes every pending packet on `host` at `now_nanos`.
pub fn relay_packets(host: &mut HostChain, packets: Vec<SentPacket>, now_nanos: u64) -> Vec<Tx> {
    packets
        .into_iter()
        .map(|sent| {
            if now_nanos >= sent.packet.timeout_nanos {
                return Tx::Timeout { packet: sent.id() };
            }
            let result = host.execute(&sent, nanos_to_secs(now_nanos));
            Tx::Ack {
                packet: sent.id(),
                ack: ack_bytes(&result),
            }
        })
        .collect()
}

/// Answers every live query from host state. Unknown kinds are skipped.
pub fn answer_queries(host: &HostChain, store: &impl KvRead, now_nanos: u64) -> Vec<Tx> {
    lsc_interchain_query::all_queries(store)
        .unwrap_or_default()
        .into_iter()
        .filter(|query| !query.is_expired(now_nanos))
        .filter_map(|query| {
            let result = host_answer(host, &query)?;
            Some(Tx::QueryResponse {
                query_id: query.id,
                result: result.encode().ok()?,
            })
        })
        .collect()
}

fn host_answer(host: &HostChain, query: &Query) -> Option<HostQueryResult> {
    let request = String::from_utf8(query.request_data.clone()).ok()?;
    let parts: Vec<&str> = request.split('/').collect();
    match (query.callback_id.as_str(), parts.as_slice()) {
        (VALIDATOR_EXCHANGE_RATE, ["validator", validator]) => Some(HostQueryResult::ExchangeRate {
            shares_to_tokens_rate: host.rate(validator),
        }),
        (DELEGATOR_SHARES, ["delegation", delegator, validator]) => Some(HostQueryResult::DelegatorShares {
            shares: host.delegator_shares(delegator, validator),
        }),
        (WITHDRAWAL_BALANCE, ["balance", address, denom]) => Some(HostQueryResult::Balance {
            amount: host.balance(address, denom),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsc_stakeibc::{OutboundPacket, PacketPayload, TransferPacket};
    use shared_types::Int;

    fn transfer(timeout_nanos: u64) -> SentPacket {
        SentPacket {
            sequence: 7,
            packet: OutboundPacket {
                connection_id: "connection-0".into(),
                port_id: "transfer".into(),
                channel_id: "channel-0".into(),
                payload: PacketPayload::Transfer(TransferPacket {
                    denom: "ibc/uatom".into(),
                    amount: Int::new(10),
                    sender: "stride1escrow".into(),
                    receiver: "cosmos1d".into(),
                }),
                timeout_nanos,
            },
        }
    }

    #[test]
    fn test_expired_packet_times_out_without_execution() {
        let mut host = HostChain::new("uatom");
        let txs = relay_packets(&mut host, vec![transfer(100)], 100);
        assert!(matches!(&txs[..], [Tx::Timeout { packet }] if packet.sequence == 7));
        assert!(host.native_balance("cosmos1d").is_zero());
    }

    #[test]
    fn test_live_packet_is_executed_and_acknowledged() {
        let mut host = HostChain::new("uatom");
        let txs = relay_packets(&mut host, vec![transfer(100)], 99);
        assert!(matches!(&txs[..], [Tx::Ack { .. }]));
        assert_eq!(host.native_balance("cosmos1d"), Int::new(10));
    }
}
