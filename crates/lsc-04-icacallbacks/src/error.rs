use lsc_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A row already exists for this packet.
    #[error("Callback already registered for {port_id}/{channel_id}/{sequence}")]
    Duplicate {
        port_id: String,
        channel_id: String,
        sequence: u64,
    },

    /// Acknowledgement bytes are not a valid envelope.
    #[error("Malformed acknowledgement: {0}")]
    MalformedAck(String),
}

pub type CallbackResult<T> = Result<T, CallbackError>;
