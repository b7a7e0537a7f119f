use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::key::CompositeKey;
use crate::traits::{KeyValue, KvIter, LedgerStore};

/// In-memory, BTreeMap-based ledger store.
///
/// Intended for tests and embedding. Entries are held in memory behind a
/// `RwLock` for safe concurrent access; the ordered map gives prefix scans
/// their key order for free. Values are cloned on read/write.
pub struct InMemoryLedgerStore {
    entries: RwLock<BTreeMap<CompositeKey, Vec<u8>>>,
}

impl InMemoryLedgerStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::from_entries(BTreeMap::new())
    }

    pub(crate) fn from_entries(entries: BTreeMap<CompositeKey, Vec<u8>>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.entries.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        map.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        let map = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        // Snapshot the range so the lock is not held while the caller iterates.
        let snapshot: Vec<KeyValue> = map
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Box::new(snapshot.into_iter().map(Ok::<_, StoreError>)))
    }

    fn write_batch(&self, batch: &[KeyValue]) -> StoreResult<()> {
        let mut map = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        for (key, value) in batch {
            map.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.entries.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryLedgerStore")
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{product_key, products_prefix, vendor_prefix, CompositeKey};

    fn scan(store: &InMemoryLedgerStore, prefix: &CompositeKey) -> Vec<KeyValue> {
        store
            .scan_prefix(prefix)
            .unwrap()
            .collect::<StoreResult<Vec<_>>>()
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryLedgerStore::new();
        let key = product_key("apple", "airpods").unwrap();
        store.put(&key, b"value").unwrap();

        assert_eq!(store.get(&key).unwrap(), Some(b"value".to_vec()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryLedgerStore::new();
        let key = product_key("apple", "airpods").unwrap();
        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn put_replaces_existing_value() {
        let store = InMemoryLedgerStore::new();
        let key = product_key("apple", "airpods").unwrap();
        store.put(&key, b"first").unwrap();
        store.put(&key, b"second").unwrap();

        assert_eq!(store.get(&key).unwrap(), Some(b"second".to_vec()));
        assert_eq!(store.len().unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Prefix scans
    // -----------------------------------------------------------------------

    #[test]
    fn scan_is_ordered_and_scoped() {
        let store = InMemoryLedgerStore::new();
        let outside = CompositeKey::new("ORDER", ["apple", "1"]).unwrap();
        store.put(&outside, b"order").unwrap();
        store
            .put(&product_key("microsoft", "office-suite").unwrap(), b"m")
            .unwrap();
        store.put(&product_key("apple", "airpods").unwrap(), b"a").unwrap();
        store.put(&product_key("apple", "ipad").unwrap(), b"i").unwrap();

        let values: Vec<Vec<u8>> = scan(&store, &products_prefix())
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"i".to_vec(), b"m".to_vec()]);
    }

    #[test]
    fn scan_by_vendor() {
        let store = InMemoryLedgerStore::new();
        store.put(&product_key("apple", "airpods").unwrap(), b"a").unwrap();
        store.put(&product_key("apple2", "x").unwrap(), b"x").unwrap();

        let hits = scan(&store, &vendor_prefix("apple").unwrap());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, product_key("apple", "airpods").unwrap());
    }

    #[test]
    fn scan_is_restartable() {
        let store = InMemoryLedgerStore::new();
        store.put(&product_key("apple", "airpods").unwrap(), b"a").unwrap();

        assert_eq!(scan(&store, &products_prefix()).len(), 1);
        assert_eq!(scan(&store, &products_prefix()).len(), 1);
    }

    #[test]
    fn scan_empty_store() {
        let store = InMemoryLedgerStore::new();
        assert!(scan(&store, &products_prefix()).is_empty());
    }

    #[test]
    fn write_batch_applies_all() {
        let store = InMemoryLedgerStore::new();
        let batch = vec![
            (product_key("a", "1").unwrap(), b"1".to_vec()),
            (product_key("a", "2").unwrap(), b"2".to_vec()),
        ];
        store.write_batch(&batch).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn boxed_store_delegates() {
        let store: Box<dyn LedgerStore> = Box::new(InMemoryLedgerStore::new());
        let key = product_key("apple", "airpods").unwrap();
        store.put(&key, b"v").unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn debug_format() {
        let store = InMemoryLedgerStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryLedgerStore"));
        assert!(debug.contains("entry_count"));
    }
}
