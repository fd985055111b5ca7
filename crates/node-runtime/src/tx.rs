//! Transactions delivered in a block and their per-tx results.

use lsc_icacallbacks::PacketId;
use lsc_stakeibc::{ControlMsg, UserMsg};
use serde::{Deserialize, Serialize};

/// One block entry. Every variant runs in its own store branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tx {
    /// LiquidStake, RedeemStake, ClaimUndelegatedTokens or LSMLiquidStake.
    User(UserMsg),
    /// Privileged message checked against the admin list.
    Control { signer: String, msg: ControlMsg },
    /// Relayed acknowledgement bytes for an outbound packet.
    Ack { packet: PacketId, ack: Vec<u8> },
    /// Relayed timeout for an outbound packet.
    Timeout { packet: PacketId },
    /// Relayed interchain query result.
    QueryResponse { query_id: String, result: Vec<u8> },
}

impl Tx {
    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(msg) => msg.name(),
            Self::Control { msg, .. } => msg.name(),
            Self::Ack { .. } => "acknowledgement",
            Self::Timeout { .. } => "timeout",
            Self::QueryResponse { .. } => "query_response",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    Applied,
    /// Rolled back; the block continues.
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub index: usize,
    pub kind: String,
    pub outcome: TxOutcome,
}

impl TxResult {
    pub fn is_applied(&self) -> bool {
        self.outcome == TxOutcome::Applied
    }

    pub(crate) fn label(&self) -> &'static str {
        match self.outcome {
            TxOutcome::Applied => "ok",
            TxOutcome::Rejected(_) => "rejected",
        }
    }
}
