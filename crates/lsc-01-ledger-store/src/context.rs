//! # Block Context
//!
//! The single handle every operation receives: the writable store, the block
//! header and the buffer of events emitted so far in this block.

use crate::error::StoreError;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use shared_types::{nanos_to_secs, BlockHeight, StakeEvent, TimestampNanos};

/// Height and time of the block being executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: BlockHeight,
    pub time_nanos: TimestampNanos,
}

impl BlockHeader {
    pub fn new(height: BlockHeight, time_nanos: TimestampNanos) -> Self {
        Self { height, time_nanos }
    }
}

pub struct BlockContext<'a> {
    store: &'a mut Store,
    header: BlockHeader,
    events: Vec<StakeEvent>,
}

impl<'a> BlockContext<'a> {
    pub fn new(store: &'a mut Store, header: BlockHeader) -> Self {
        Self {
            store,
            header,
            events: Vec::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut *self.store
    }

    pub fn header(&self) -> BlockHeader {
        self.header
    }

    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    pub fn block_time_nanos(&self) -> TimestampNanos {
        self.header.time_nanos
    }

    pub fn block_time_secs(&self) -> u64 {
        nanos_to_secs(self.header.time_nanos)
    }

    pub fn emit(&mut self, event: StakeEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[StakeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<StakeEvent> {
        self.events
    }

    /// Runs `f` in a nested write layer.
    ///
    /// `Ok` folds the layer into the enclosing one. `Err` discards the layer
    /// and every event `f` emitted.
    pub fn branch<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.store.begin();
        let mark = self.events.len();
        match f(self) {
            Ok(value) => {
                self.store.commit()?;
                Ok(value)
            }
            Err(err) => {
                self.store.rollback()?;
                self.events.truncate(mark);
                Err(err)
            }
        }
    }
}
