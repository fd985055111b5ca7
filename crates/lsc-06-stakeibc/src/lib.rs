//! # lsc-stakeibc
//!
//! The liquid-staking orchestrator: host zones, validator accounting and
//! the redemption-rate state machine.
//!
//! ## Architecture
//!
//! ```text
//!            user msgs / control msgs / acks / query responses
//!                                 │
//!                                 ▼
//!   ┌──────────────────────── StakeIbcKeeper ─────────────────────────┐
//!   │  liquid_stake · redeem_stake · claim · lsm · governance          │
//!   │  epoch hooks ─► deposits · unbonding · rewards · rebalance · RR  │
//!   └───────┬──────────────────┬──────────────────┬────────────────────┘
//!           │ Bank             │ TransportLayer   │ AccountKeeper
//!           ▼                  ▼                  ▼
//!      StoreBank        PacketTransport     Bech32Accounts
//! ```
//!
//! Every operation runs inside a [`lsc_ledger_store::BlockContext`] branch:
//! it either applies all of its writes and events or none of them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let keeper = StakeIbcKeeper::new(params, bank, accounts, transport);
//! let minted = keeper.liquid_stake(&mut ctx, &MsgLiquidStake { .. })?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod keeper;
pub mod ports;

pub use adapters::{Bech32Accounts, PacketTransport, SentPacket, StoreBank};
pub use config::Params;
pub use domain::{
    CallbackArgs, ControlMsg, HostQueryResult, HostZone, HostZoneConfig, IcaAccountType, MsgClaimUndelegatedTokens,
    MsgLiquidStake, MsgLsmLiquidStake, MsgRedeemStake, MsgResponse, OutboundPacket, PacketPayload, RedemptionBounds,
    RemoteMsg, TransferPacket, UserMsg, Validator, ValidatorConfig,
};
pub use error::{StakeIbcError, StakeIbcResult};
pub use keeper::{halt_matches_redemption_rate, StakeIbcKeeper};
pub use ports::{AccountKeeper, Bank, DenomTrace, TransportLayer};
