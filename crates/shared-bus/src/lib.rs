//! # Shared Bus - Committed Event Fan-out
//!
//! Ledgers and the orchestrator emit [`StakeEvent`]s into the block context.
//! Once the block commits, the runtime stamps each event with the block
//! height and time and publishes it here. Events from rolled-back branches
//! never reach the bus.
//!
//! ```text
//! ┌──────────────┐  commit   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │ NodeRuntime  │ ────────▶ │  Event Bus   │ ────────────▶ │  Indexers /  │
//! │ (block exec) │ publish() │ (broadcast)  │   filtered    │  Relayers    │
//! └──────────────┘           └──────────────┘               └──────────────┘
//! ```
//!
//! Subscribers that fall behind by more than the channel capacity skip the
//! oldest events; the bus never blocks block execution.
//!
//! [`StakeEvent`]: shared_types::StakeEvent

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{CommittedEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Per-subscriber backlog before the oldest events are skipped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
