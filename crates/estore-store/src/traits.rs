use std::sync::Arc;

use crate::error::StoreResult;
use crate::key::CompositeKey;

/// A key and the bytes stored under it.
pub type KeyValue = (CompositeKey, Vec<u8>);

/// Key-ordered iterator returned by [`LedgerStore::scan_prefix`].
///
/// Items are results so a backend can report a failure part-way through a
/// scan.
pub type KvIter<'a> = Box<dyn Iterator<Item = StoreResult<KeyValue>> + 'a>;

/// Transactional key-value ledger.
///
/// This is the only surface the store contract reads and writes through.
/// All implementations must satisfy these invariants:
/// - `put` replaces any value already stored under the key.
/// - `scan_prefix` yields every key starting with the prefix, in ascending
///   key order, and nothing else. Each call starts a fresh scan.
/// - A batch passed to `write_batch` is applied entirely or not at all.
/// - The store never interprets values -- it is a pure key-value store.
/// - All I/O errors are propagated, never silently ignored.
pub trait LedgerStore: Send + Sync {
    /// Read the value under `key`.
    ///
    /// Returns `Ok(None)` if nothing is stored there.
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()>;

    /// Iterate every entry whose key starts with `prefix`.
    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>>;

    /// Apply several writes as one unit.
    ///
    /// Default implementation calls `put()` for each entry. Backends that can
    /// fail between writes must override this to keep the batch atomic.
    fn write_batch(&self, batch: &[KeyValue]) -> StoreResult<()> {
        batch.iter().try_for_each(|(key, value)| self.put(key, value))
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Box<T> {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        (**self).scan_prefix(prefix)
    }

    fn write_batch(&self, batch: &[KeyValue]) -> StoreResult<()> {
        (**self).write_batch(batch)
    }
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        (**self).scan_prefix(prefix)
    }

    fn write_batch(&self, batch: &[KeyValue]) -> StoreResult<()> {
        (**self).write_batch(batch)
    }
}
