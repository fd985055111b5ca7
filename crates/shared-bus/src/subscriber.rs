//! # Event Subscriber
//!
//! A [`Subscription`] is one receiver on the broadcast channel plus the
//! filter it applies. Each live subscription registers interest in the
//! topics its filter accepts; the publisher consults that table so events
//! nobody wants are counted but never broadcast.

use crate::events::{CommittedEvent, EventFilter, EventTopic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// Live subscriber counts per topic.
#[derive(Debug, Default)]
pub(crate) struct TopicInterest {
    counts: Mutex<HashMap<EventTopic, usize>>,
}

impl TopicInterest {
    pub(crate) fn register(&self, filter: &EventFilter) {
        let mut counts = self.counts.lock();
        for topic in filter.accepted_topics() {
            *counts.entry(topic).or_default() += 1;
        }
    }

    pub(crate) fn release(&self, filter: &EventFilter) {
        let mut counts = self.counts.lock();
        for topic in filter.accepted_topics() {
            if let Some(count) = counts.get_mut(&topic) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    counts.remove(&topic);
                }
            }
        }
    }

    pub(crate) fn wanted(&self, topic: EventTopic) -> bool {
        self.counts.lock().contains_key(&topic)
    }

    pub(crate) fn subscribers_for(&self, topic: EventTopic) -> usize {
        self.counts.lock().get(&topic).copied().unwrap_or(0)
    }
}

/// Releases a filter's topic interest when dropped.
struct InterestGuard {
    filter: EventFilter,
    interest: Arc<TopicInterest>,
}

impl InterestGuard {
    fn acquire(filter: &EventFilter, interest: Arc<TopicInterest>) -> Self {
        interest.register(filter);
        Self {
            filter: filter.clone(),
            interest,
        }
    }
}

impl Drop for InterestGuard {
    fn drop(&mut self) {
        self.interest.release(&self.filter);
        debug!(topics = ?self.filter.topics, chain_id = ?self.filter.chain_id, "Subscription closed");
    }
}

/// Filtered receiver. Dropping it withdraws its topic interest.
pub struct Subscription {
    receiver: broadcast::Receiver<CommittedEvent>,
    filter: EventFilter,
    _guard: InterestGuard,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<CommittedEvent>,
        filter: EventFilter,
        interest: Arc<TopicInterest>,
    ) -> Self {
        let guard = InterestGuard::acquire(&filter, interest);
        Self {
            receiver,
            filter,
            _guard: guard,
        }
    }

    /// Waits for the next committed event the filter accepts. `None` once
    /// the bus is gone.
    pub async fn recv(&mut self) -> Option<CommittedEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(committed) if self.filter.matches(&committed) => return Some(committed),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, topics = ?self.filter.topics, "Subscriber fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Drains buffered events until one matches. `Ok(None)` when the buffer
    /// holds nothing this subscription wants.
    pub fn try_recv(&mut self) -> Result<Option<CommittedEvent>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(committed) if self.filter.matches(&committed) => return Ok(Some(committed)),
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

/// [`Stream`] over the events a filter accepts. Keeps the originating
/// subscription's topic interest alive until dropped.
pub struct EventStream {
    inner: BroadcastStream<CommittedEvent>,
    filter: EventFilter,
    _guard: InterestGuard,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        let Subscription {
            receiver,
            filter,
            _guard: guard,
        } = subscription;
        Self {
            inner: BroadcastStream::new(receiver),
            filter,
            _guard: guard,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Stream for EventStream {
    type Item = CommittedEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(committed))) if self.filter.matches(&committed) => {
                    return Poll::Ready(Some(committed));
                }
                Poll::Ready(Some(Ok(_))) => {}
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "Event stream fell behind");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
