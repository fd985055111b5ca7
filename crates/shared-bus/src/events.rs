//! # Committed Events
//!
//! The envelope the bus carries, and the topic taxonomy subscribers filter
//! on.

use serde::{Deserialize, Serialize};
use shared_types::{BlockHeight, StakeEvent, TimestampNanos};

/// A [`StakeEvent`] stamped with the block that committed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedEvent {
    pub height: BlockHeight,
    pub time_nanos: TimestampNanos,
    pub event: StakeEvent,
}

impl CommittedEvent {
    #[must_use]
    pub fn new(height: BlockHeight, time_nanos: TimestampNanos, event: StakeEvent) -> Self {
        Self {
            height,
            time_nanos,
            event,
        }
    }

    #[must_use]
    pub fn topic(&self) -> EventTopic {
        EventTopic::of(&self.event)
    }

    /// One-line JSON rendering for event logs.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Coarse grouping of events for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Liquid stakes, redemptions and claims.
    User,
    /// Remote call submission and resolution.
    RemoteCall,
    /// Delegation, unbonding, reward and slash accounting.
    Accounting,
    /// Redemption rate movements, freezes and halts.
    Safety,
    /// Governance changes to zones and validators.
    Control,
    /// Interchain query lifecycle.
    Query,
    /// Epoch boundaries.
    Epoch,
    /// Store migrations.
    Migration,
}

impl EventTopic {
    pub const ALL: [Self; 8] = [
        Self::User,
        Self::RemoteCall,
        Self::Accounting,
        Self::Safety,
        Self::Control,
        Self::Query,
        Self::Epoch,
        Self::Migration,
    ];

    #[must_use]
    pub fn of(event: &StakeEvent) -> Self {
        match event {
            StakeEvent::LiquidStake { .. }
            | StakeEvent::LsmLiquidStake { .. }
            | StakeEvent::RedeemStake { .. }
            | StakeEvent::ClaimSubmitted { .. }
            | StakeEvent::ClaimCompleted { .. }
            | StakeEvent::ClaimFailed { .. } => Self::User,
            StakeEvent::RemoteCallSubmitted { .. }
            | StakeEvent::CallbackResolved { .. }
            | StakeEvent::CallbackMissing { .. } => Self::RemoteCall,
            StakeEvent::DelegationApplied { .. }
            | StakeEvent::UndelegationApplied { .. }
            | StakeEvent::Redelegated { .. }
            | StakeEvent::RewardsReinvested { .. }
            | StakeEvent::UnbondingClaimable { .. }
            | StakeEvent::SlashDetected { .. } => Self::Accounting,
            StakeEvent::RedemptionRateUpdated { .. }
            | StakeEvent::RedemptionRateFrozen { .. }
            | StakeEvent::HostZoneHalted { .. }
            | StakeEvent::HostZoneResumed { .. } => Self::Safety,
            StakeEvent::HostZoneRegistered { .. }
            | StakeEvent::ValidatorAdded { .. }
            | StakeEvent::ValidatorRemoved { .. }
            | StakeEvent::ValidatorWeightChanged { .. }
            | StakeEvent::RedemptionBoundsUpdated { .. } => Self::Control,
            StakeEvent::QuerySubmitted { .. }
            | StakeEvent::QueryResolved { .. }
            | StakeEvent::QueryExpired { .. } => Self::Query,
            StakeEvent::EpochEnded { .. } => Self::Epoch,
            StakeEvent::MigrationApplied { .. } => Self::Migration,
        }
    }
}

/// Which events a subscription receives.
///
/// An empty topic list accepts every topic. A chain filter only accepts
/// events that name that host zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub topics: Vec<EventTopic>,
    pub chain_id: Option<String>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            chain_id: None,
        }
    }

    #[must_use]
    pub fn for_chain(mut self, chain_id: impl Into<String>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Topics this filter can accept.
    #[must_use]
    pub fn accepted_topics(&self) -> Vec<EventTopic> {
        if self.topics.is_empty() {
            EventTopic::ALL.to_vec()
        } else {
            let mut topics = Vec::with_capacity(self.topics.len());
            for topic in &self.topics {
                if !topics.contains(topic) {
                    topics.push(*topic);
                }
            }
            topics
        }
    }

    #[must_use]
    pub fn matches(&self, committed: &CommittedEvent) -> bool {
        let topic_ok = self.topics.is_empty() || self.topics.contains(&committed.topic());
        let chain_ok = match &self.chain_id {
            None => true,
            Some(wanted) => committed.event.chain_id() == Some(wanted.as_str()),
        };
        topic_ok && chain_ok
    }
}
