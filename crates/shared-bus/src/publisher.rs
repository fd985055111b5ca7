//! # Event Publisher
//!
//! The runtime hands every committed block's events to [`EventPublisher::publish_block`].
//! [`InMemoryEventBus`] fans them out over a `tokio::sync::broadcast`
//! channel, skipping the send for topics no live subscription accepts.

use crate::events::{CommittedEvent, EventFilter, EventTopic};
use crate::subscriber::{EventStream, EventSubscriber, Subscription, TopicInterest};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use shared_types::{BlockHeight, StakeEvent, TimestampNanos};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hands one event to the bus. Returns how many receivers got it.
    async fn publish(&self, event: CommittedEvent) -> usize;

    /// Events accepted since the bus was created, delivered or not.
    fn events_published(&self) -> u64;

    /// Stamps `events` with the committing block and publishes them in
    /// emission order. Returns the number of events stamped.
    async fn publish_block(
        &self,
        height: BlockHeight,
        time_nanos: TimestampNanos,
        events: Vec<StakeEvent>,
    ) -> usize {
        let mut stamped = 0;
        for event in events {
            self.publish(CommittedEvent::new(height, time_nanos, event)).await;
            stamped += 1;
        }
        stamped
    }
}

pub struct InMemoryEventBus {
    sender: broadcast::Sender<CommittedEvent>,
    interest: Arc<TopicInterest>,
    accepted: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` is the per-subscriber backlog before the oldest events
    /// are skipped.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
            interest: Arc::new(TopicInterest::default()),
            accepted: AtomicU64::new(0),
            capacity,
        }
    }

    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.subscribe(filter))
    }

    /// Live receivers on the channel.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Live subscriptions whose filter accepts `topic`.
    #[must_use]
    pub fn subscribers_for(&self, topic: EventTopic) -> usize {
        self.interest.subscribers_for(topic)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, chain_id = ?filter.chain_id, "Subscription opened");
        Subscription::new(self.sender.subscribe(), filter, Arc::clone(&self.interest))
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: CommittedEvent) -> usize {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        let topic = event.topic();
        if !self.interest.wanted(topic) {
            trace!(?topic, kind = event.event.kind(), height = event.height, "No subscriber for topic");
            return 0;
        }
        let (kind, height) = (event.event.kind(), event.height);
        let receivers = self.sender.send(event).unwrap_or(0);
        debug!(?topic, kind, height, receivers, "Event broadcast");
        receivers
    }

    fn events_published(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }
}
