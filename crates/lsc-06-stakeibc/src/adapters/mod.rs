//! In-store adapters for the orchestrator's ports.

pub mod accounts;
pub mod bank;
pub mod transport;

pub use accounts::{encode_address, module_address, Bech32Accounts};
pub use bank::StoreBank;
pub use transport::{PacketTransport, SentPacket};
