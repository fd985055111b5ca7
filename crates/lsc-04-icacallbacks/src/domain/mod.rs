mod ack;
mod callback;

pub use ack::{AckResponse, Acknowledgement};
pub use callback::{CallbackData, PacketId};
