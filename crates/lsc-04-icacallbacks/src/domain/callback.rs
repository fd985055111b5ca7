use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport coordinates of one outbound packet.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PacketId {
    pub port_id: String,
    pub channel_id: String,
    pub sequence: u64,
}

impl PacketId {
    pub fn new(port_id: impl Into<String>, channel_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            port_id: port_id.into(),
            channel_id: channel_id.into(),
            sequence,
        }
    }
}

impl fmt::Display for PacketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.port_id, self.channel_id, self.sequence)
    }
}

/// What to do when the packet at `packet` resolves.
///
/// `callback_args` holds the encoded arguments of the handler named by
/// `callback_id`; this ledger never interprets them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    pub packet: PacketId,
    pub callback_id: String,
    pub callback_args: Vec<u8>,
    pub submission_height: u64,
}
