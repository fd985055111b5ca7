use crate::error::{CallbackError, CallbackResult};
use serde::{Deserialize, Serialize};
use shared_types::CallbackOutcome;

/// Acknowledgement envelope written by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Acknowledgement {
    /// One encoded response per submitted message, in order.
    Result(Vec<Vec<u8>>),
    Error(String),
}

impl Acknowledgement {
    pub fn encode(&self) -> Vec<u8> {
        // a two-variant enum of byte vectors and a string always serializes
        bincode::serialize(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> CallbackResult<Self> {
        bincode::deserialize(bytes).map_err(|e| CallbackError::MalformedAck(e.to_string()))
    }
}

/// Normalized view of an ack or timeout handed to typed handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AckResponse {
    pub status: CallbackOutcome,
    pub msg_responses: Vec<Vec<u8>>,
    pub error: Option<String>,
}

impl AckResponse {
    pub fn from_ack_bytes(bytes: &[u8]) -> CallbackResult<Self> {
        Ok(match Acknowledgement::decode(bytes)? {
            Acknowledgement::Result(msg_responses) => Self {
                status: CallbackOutcome::Success,
                msg_responses,
                error: None,
            },
            Acknowledgement::Error(reason) => Self {
                status: CallbackOutcome::Failure,
                msg_responses: Vec::new(),
                error: Some(reason),
            },
        })
    }

    pub fn timeout() -> Self {
        Self {
            status: CallbackOutcome::Timeout,
            msg_responses: Vec::new(),
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CallbackOutcome::Success
    }
}
