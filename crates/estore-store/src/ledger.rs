//! Transaction boundaries around a ledger store.
//!
//! The contract logic assumes each invocation runs in isolation and that its
//! writes land atomically. [`Ledger`] provides both for any [`LedgerStore`]
//! backend: invocations are serialized, and each one works against a
//! [`TxContext`] whose write set is committed as a single batch only when the
//! invocation succeeds.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::CompositeKey;
use crate::traits::{KeyValue, KvIter, LedgerStore};

/// A ledger backend with per-invocation transactions.
pub struct Ledger<S> {
    store: S,
    serial: Mutex<()>,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            serial: Mutex::new(()),
        }
    }

    /// The committed state, bypassing transactions.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one invocation.
    ///
    /// `invocation` sees its own writes. If it returns `Ok`, every buffered
    /// write is committed in one batch; if it returns `Err`, nothing is.
    /// Concurrent calls are serialized, so two invocations that read and then
    /// write the same key cannot both act on the same prior value.
    pub fn transact<T, E, F>(&self, invocation: F) -> Result<T, E>
    where
        F: FnOnce(&TxContext<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _serial = self.serial.lock().map_err(|_| StoreError::LockPoisoned)?;

        let tx = TxContext::new(&self.store);
        let output = match invocation(&tx) {
            Ok(output) => output,
            Err(e) => {
                debug!(pending = tx.pending().unwrap_or_default(), "transaction aborted");
                return Err(e);
            }
        };

        let writes = tx.into_writes()?;
        if !writes.is_empty() {
            self.store.write_batch(&writes)?;
        }
        debug!(writes = writes.len(), "transaction committed");
        Ok(output)
    }

    /// Run an invocation that only reads.
    ///
    /// The invocation sees committed state directly and nothing is buffered
    /// or committed. Any write it attempts fails with
    /// [`StoreError::ReadOnly`].
    pub fn query<T, E, F>(&self, invocation: F) -> Result<T, E>
    where
        F: FnOnce(&ReadOnlyView<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _serial = self.serial.lock().map_err(|_| StoreError::LockPoisoned)?;
        invocation(&ReadOnlyView {
            committed: &self.store,
        })
    }
}

impl<S> std::fmt::Debug for Ledger<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").field("store", &self.store).finish()
    }
}

/// The view of the ledger one invocation works against.
///
/// Reads fall through to the committed store unless the key was written
/// earlier in the same invocation. Scans merge buffered writes into the
/// committed entries, preserving key order.
pub struct TxContext<'a> {
    committed: &'a dyn LedgerStore,
    writes: Mutex<BTreeMap<CompositeKey, Vec<u8>>>,
}

impl<'a> TxContext<'a> {
    pub fn new(committed: &'a dyn LedgerStore) -> Self {
        Self {
            committed,
            writes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of buffered writes.
    pub fn pending(&self) -> StoreResult<usize> {
        Ok(self.writes.lock().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Consume the context, yielding the buffered write set in key order.
    pub fn into_writes(self) -> StoreResult<Vec<KeyValue>> {
        let writes = self
            .writes
            .into_inner()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(writes.into_iter().collect())
    }
}

impl LedgerStore for TxContext<'_> {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        {
            let writes = self.writes.lock().map_err(|_| StoreError::LockPoisoned)?;
            if let Some(value) = writes.get(key) {
                return Ok(Some(value.clone()));
            }
        }
        self.committed.get(key)
    }

    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()> {
        let mut writes = self.writes.lock().map_err(|_| StoreError::LockPoisoned)?;
        writes.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        let mut merged: BTreeMap<CompositeKey, Vec<u8>> = self
            .committed
            .scan_prefix(prefix)?
            .collect::<StoreResult<_>>()?;

        let writes = self.writes.lock().map_err(|_| StoreError::LockPoisoned)?;
        merged.extend(
            writes
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(prefix))
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Ok(Box::new(merged.into_iter().map(Ok::<_, StoreError>)))
    }
}

/// Committed ledger state with writes disabled.
pub struct ReadOnlyView<'a> {
    committed: &'a dyn LedgerStore,
}

impl LedgerStore for ReadOnlyView<'_> {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        self.committed.get(key)
    }

    fn put(&self, key: &CompositeKey, _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::ReadOnly(key.clone()))
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        self.committed.scan_prefix(prefix)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::key::{product_key, products_prefix};
    use crate::memory::InMemoryLedgerStore;

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("store: {0}")]
        Store(#[from] StoreError),
        #[error("key: {0}")]
        Key(#[from] crate::error::KeyError),
        #[error("rejected")]
        Rejected,
    }

    #[test]
    fn commit_on_success() {
        let ledger = Ledger::new(InMemoryLedgerStore::new());
        let key = product_key("apple", "airpods").unwrap();

        ledger
            .transact(|tx| -> Result<(), TestError> {
                tx.put(&key, b"v")?;
                Ok(())
            })
            .unwrap();

        assert_eq!(ledger.store().get(&key).unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn abort_discards_writes() {
        let ledger = Ledger::new(InMemoryLedgerStore::new());
        let key = product_key("apple", "airpods").unwrap();

        let result = ledger.transact(|tx| -> Result<(), TestError> {
            tx.put(&key, b"v")?;
            Err(TestError::Rejected)
        });

        assert!(matches!(result, Err(TestError::Rejected)));
        assert!(ledger.store().get(&key).unwrap().is_none());
    }

    #[test]
    fn reads_see_own_writes() {
        let ledger = Ledger::new(InMemoryLedgerStore::new());
        let key = product_key("apple", "airpods").unwrap();
        ledger.store().put(&key, b"committed").unwrap();

        let seen = ledger
            .transact(|tx| -> Result<_, TestError> {
                let before = tx.get(&key)?;
                tx.put(&key, b"buffered")?;
                let after = tx.get(&key)?;
                assert!(ledger.store().get(&key)?.as_deref() == Some(&b"committed"[..]));
                Ok((before, after))
            })
            .unwrap();

        assert_eq!(seen.0, Some(b"committed".to_vec()));
        assert_eq!(seen.1, Some(b"buffered".to_vec()));
    }

    #[test]
    fn scan_merges_buffered_writes() {
        let store = InMemoryLedgerStore::new();
        store.put(&product_key("a", "1").unwrap(), b"old").unwrap();
        store.put(&product_key("c", "3").unwrap(), b"c").unwrap();
        let ledger = Ledger::new(store);

        let scanned = ledger
            .transact(|tx| -> Result<Vec<KeyValue>, TestError> {
                tx.put(&product_key("a", "1")?, b"new")?;
                tx.put(&product_key("b", "2")?, b"b")?;
                tx.put(&CompositeKey::new("OTHER", ["x"])?, b"x")?;
                Ok(tx.scan_prefix(&products_prefix())?.collect::<StoreResult<_>>()?)
            })
            .unwrap();

        let values: Vec<&[u8]> = scanned.iter().map(|(_, v)| v.as_slice()).collect();
        assert_eq!(values, vec![&b"new"[..], &b"b"[..], &b"c"[..]]);
    }

    #[test]
    fn query_reads_committed_state_and_rejects_writes() {
        let ledger = Ledger::new(InMemoryLedgerStore::new());
        let key = product_key("apple", "airpods").unwrap();
        ledger.store().put(&key, b"committed").unwrap();

        let seen = ledger
            .query(|view| -> Result<_, TestError> { Ok(view.get(&key)?) })
            .unwrap();
        assert_eq!(seen, Some(b"committed".to_vec()));

        let result = ledger.query(|view| -> Result<(), TestError> {
            view.put(&key, b"sneaky")?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(TestError::Store(StoreError::ReadOnly(rejected))) if rejected == key
        ));
        assert_eq!(ledger.store().get(&key).unwrap(), Some(b"committed".to_vec()));
    }

    #[test]
    fn serialized_read_modify_write() {
        let ledger = Arc::new(Ledger::new(InMemoryLedgerStore::new()));
        let key = product_key("counter", "c").unwrap();
        ledger.store().put(&key, &0u32.to_le_bytes()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let key = key.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        ledger
                            .transact(|tx| -> Result<(), TestError> {
                                let raw = tx.get(&key)?.unwrap();
                                let n = u32::from_le_bytes(raw.try_into().unwrap());
                                tx.put(&key, &(n + 1).to_le_bytes())?;
                                Ok(())
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let raw = ledger.store().get(&key).unwrap().unwrap();
        assert_eq!(u32::from_le_bytes(raw.try_into().unwrap()), 200);
    }
}
