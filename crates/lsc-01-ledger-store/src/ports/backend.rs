use crate::error::StoreResult;
use std::collections::BTreeMap;

/// Pending writes; `None` marks a deletion.
pub type WriteBatch = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Durable ordered key/value storage underneath [`crate::Store`].
///
/// Implementations must iterate in byte-lexicographic key order and apply a
/// batch atomically.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;
    fn scan_prefix(&self, prefix: &[u8]) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;
    fn write_batch(&self, batch: WriteBatch) -> StoreResult<()>;
}
