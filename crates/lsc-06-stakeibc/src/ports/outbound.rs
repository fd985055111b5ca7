//! Outbound (Driven) ports for the orchestrator.
//!
//! Every port reads and writes through the block's [`Store`], so its effects
//! commit or roll back with the operation that caused them.

use crate::domain::OutboundPacket;
use crate::error::StakeIbcResult;
use lsc_icacallbacks::PacketId;
use lsc_ledger_store::Store;
use serde::{Deserialize, Serialize};
use shared_types::{Coin, Int};

/// Packet transport towards host chains.
pub trait TransportLayer: Send + Sync {
    /// Queues a packet for relaying.
    ///
    /// # Returns
    /// - `Ok(sequence)`: The packet's sequence on its (port, channel)
    /// - `Err(RemoteSubmissionFailed)`: The packet was rejected synchronously
    fn submit(&self, store: &mut Store, packet: OutboundPacket) -> StakeIbcResult<u64>;

    /// Drops the packet commitment once its ack or timeout is processed.
    fn clear(&self, store: &mut Store, packet: &PacketId) -> StakeIbcResult<()>;
}

/// Origin of a wrapped denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomTrace {
    /// `transfer/<channel>` hops.
    pub path: String,
    pub base_denom: String,
}

impl DenomTrace {
    /// Channel of a single-hop `transfer/<channel>` path.
    pub fn channel_id(&self) -> Option<&str> {
        self.path.strip_prefix("transfer/").filter(|c| !c.contains('/'))
    }
}

/// Local token ledger.
pub trait Bank: Send + Sync {
    fn balance(&self, store: &Store, address: &str, denom: &str) -> StakeIbcResult<Int>;

    fn supply(&self, store: &Store, denom: &str) -> StakeIbcResult<Int>;

    /// Creates `coin` in `to`'s balance.
    fn mint(&self, store: &mut Store, to: &str, coin: &Coin) -> StakeIbcResult<()>;

    /// Destroys `coin` from `from`'s balance.
    ///
    /// # Returns
    /// - `Err(InsufficientBalance)`: `from` holds less than `coin`
    fn burn(&self, store: &mut Store, from: &str, coin: &Coin) -> StakeIbcResult<()>;

    /// Moves `coin` between accounts.
    ///
    /// # Returns
    /// - `Err(InsufficientBalance)`: `from` holds less than `coin`
    fn send(&self, store: &mut Store, from: &str, to: &str, coin: &Coin) -> StakeIbcResult<()>;

    fn denom_trace(&self, store: &Store, ibc_denom: &str) -> StakeIbcResult<Option<DenomTrace>>;

    /// Every `(address, amount)` holding `denom`, by address.
    fn holders(&self, store: &Store, denom: &str) -> StakeIbcResult<Vec<(String, Int)>>;
}

/// Local account registry and address codec.
pub trait AccountKeeper: Send + Sync {
    /// Returns the module account's address, creating it on first use.
    fn create_module_account(&self, store: &mut Store, name: &str) -> StakeIbcResult<String>;

    fn resolve(&self, store: &Store, name: &str) -> StakeIbcResult<Option<String>>;

    /// Validates `address` and checks its human-readable part.
    ///
    /// # Returns
    /// - `Ok(address)`: Canonical lowercase address
    /// - `Err(InvalidAddress)`: Bad checksum or unexpected prefix
    fn parse_bech32(&self, address: &str, expected_prefix: &str) -> StakeIbcResult<String>;
}
