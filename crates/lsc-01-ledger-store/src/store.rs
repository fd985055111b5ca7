//! # Layered Store
//!
//! A stack of in-memory write layers over a [`KvBackend`]:
//!
//! ```text
//!   layer n   (innermost branch)   ──┐ reads search top-down,
//!   ...                              │ first hit wins; a `None`
//!   layer 0   (block)                │ entry hides lower values
//!   backend   (committed state)    ──┘
//! ```
//!
//! `commit` folds the top layer into the one beneath it (or into the backend
//! when it is the last); `rollback` drops it.

use crate::adapters::MemoryBackend;
use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::ports::{KvBackend, WriteBatch};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Read access shared by [`Store`] and [`Snapshot`].
pub trait KvRead {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Entries under `prefix` in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get_value<T: DeserializeOwned>(&self, key: &[u8]) -> StoreResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(bytes) => Ok(Some(codec::decode(key, &bytes)?)),
            None => Ok(None),
        }
    }

    fn values_with_prefix<T: DeserializeOwned>(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, T)>>
    where
        Self: Sized,
    {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, bytes)| {
                let value = codec::decode(&key, &bytes)?;
                Ok((key, value))
            })
            .collect()
    }
}

/// Transactional view over a backend.
pub struct Store {
    backend: Arc<dyn KvBackend>,
    layers: Vec<WriteBatch>,
}

impl Store {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            layers: Vec::new(),
        }
    }

    /// Store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Number of open write layers.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn begin(&mut self) {
        self.layers.push(WriteBatch::new());
    }

    pub fn commit(&mut self) -> StoreResult<()> {
        let top = self.pop_layer("commit")?;
        let depth = self.layers.len();
        match self.layers.last_mut() {
            Some(parent) => {
                trace!(depth, writes = top.len(), "Write layer merged");
                parent.extend(top);
                Ok(())
            }
            None => {
                let deletes = top.values().filter(|value| value.is_none()).count();
                let writes = top.len() - deletes;
                self.backend.write_batch(top).inspect_err(|e| {
                    warn!(writes, deletes, error = %e, "Backend rejected committed batch");
                })?;
                debug!(writes, deletes, "Write layer flushed to backend");
                Ok(())
            }
        }
    }

    pub fn rollback(&mut self) -> StoreResult<()> {
        let top = self.pop_layer("rollback")?;
        debug!(depth = self.layers.len(), discarded = top.len(), "Write layer rolled back");
        Ok(())
    }

    fn pop_layer(&mut self, op: &'static str) -> StoreResult<WriteBatch> {
        self.layers.pop().ok_or_else(|| {
            warn!(op, "No open write layer");
            StoreError::NoOpenLayer
        })
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> StoreResult<()> {
        self.write(key, Some(value))
    }

    pub fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.write(key.to_vec(), None)
    }

    pub fn set_value<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> StoreResult<()> {
        let bytes = codec::encode(value)?;
        self.set(key, bytes)
    }

    /// Copy of the merged state, safe to read while this store keeps writing.
    pub fn snapshot(&self) -> StoreResult<Snapshot> {
        let entries = self.scan_prefix(&[])?.into_iter().collect();
        Ok(Snapshot { entries })
    }

    fn write(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) -> StoreResult<()> {
        match self.layers.last_mut() {
            Some(layer) => {
                layer.insert(key, value);
                Ok(())
            }
            None => {
                let mut batch = WriteBatch::new();
                batch.insert(key, value);
                self.backend.write_batch(batch)
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl KvRead for Store {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        for layer in self.layers.iter().rev() {
            if let Some(entry) = layer.get(key) {
                return Ok(entry.clone());
            }
        }
        self.backend.get(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.scan_prefix(prefix)?.into_iter().collect();
        for layer in &self.layers {
            let pending = layer
                .range(prefix.to_vec()..)
                .take_while(|(key, _)| key.starts_with(prefix));
            for (key, value) in pending {
                match value {
                    Some(value) => {
                        merged.insert(key.clone(), value.clone());
                    }
                    None => {
                        merged.remove(key);
                    }
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

/// Immutable point-in-time copy for read-only lookups.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvRead for Snapshot {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}
