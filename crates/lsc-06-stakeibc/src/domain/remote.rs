//! Typed intents sent to host chains and the responses they acknowledge with.

use crate::error::{StakeIbcError, StakeIbcResult};
use serde::{Deserialize, Serialize};
use shared_types::{Coin, Int};

/// A single message executed by an interchain account on the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteMsg {
    Delegate {
        delegator: String,
        validator: String,
        amount: Coin,
    },
    Undelegate {
        delegator: String,
        validator: String,
        amount: Coin,
    },
    Redelegate {
        delegator: String,
        src_validator: String,
        dst_validator: String,
        amount: Coin,
    },
    WithdrawReward {
        delegator: String,
        validator: String,
    },
    BankSend {
        from: String,
        to: String,
        amount: Coin,
    },
    /// Converts tokenized shares back into a native delegation.
    RedeemTokensForShares {
        delegator: String,
        amount: Coin,
    },
}

/// Per-message result inside a success acknowledgement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgResponse {
    Empty,
    Undelegate { completion_time_secs: u64 },
    WithdrawReward { amount: Int },
}

impl MsgResponse {
    pub fn encode(&self) -> StakeIbcResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StakeIbcError::Internal(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> StakeIbcResult<Self> {
        bincode::deserialize(bytes).map_err(|e| StakeIbcError::CallbackDecode(e.to_string()))
    }
}

/// Fungible token transfer from a local account to a host address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPacket {
    pub denom: String,
    pub amount: Int,
    pub sender: String,
    pub receiver: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketPayload {
    IcaTx(Vec<RemoteMsg>),
    Transfer(TransferPacket),
}

/// What the orchestrator hands the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPacket {
    pub connection_id: String,
    pub port_id: String,
    pub channel_id: String,
    pub payload: PacketPayload,
    /// Absolute block-time deadline.
    pub timeout_nanos: u64,
}
