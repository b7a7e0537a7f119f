use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::CompositeKey;
use crate::memory::InMemoryLedgerStore;
use crate::traits::{KeyValue, KvIter, LedgerStore};
use crate::wal::{WalRecord, WriteAheadLog};

/// Ledger store persisted as a write-ahead log.
///
/// Every batch is appended to the log before it becomes visible, and the
/// full key space is rebuilt from the log when the store is opened. Reads
/// and scans are served from memory.
pub struct FileLedgerStore {
    wal: WriteAheadLog,
    state: InMemoryLedgerStore,
    /// Keeps log order and in-memory apply order identical.
    commit: Mutex<()>,
}

impl FileLedgerStore {
    /// Open the store at `path`, replaying any existing log.
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> StoreResult<Self> {
        let path = path.as_ref();
        let wal = WriteAheadLog::open(path, config.sync_mode)?;

        let recovery = wal.recover()?;
        if recovery.valid_len < wal.offset()? {
            wal.truncate(recovery.valid_len)?;
        }

        let batches = recovery.records.len();
        let mut entries = BTreeMap::new();
        for record in recovery.records {
            entries.extend(record.writes);
        }

        info!(path = %path.display(), batches, keys = entries.len(), "opened ledger file");
        Ok(Self {
            wal,
            state: InMemoryLedgerStore::from_entries(entries),
            commit: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        self.wal.path()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        self.state.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        self.state.is_empty()
    }
}

impl LedgerStore for FileLedgerStore {
    fn get(&self, key: &CompositeKey) -> StoreResult<Option<Vec<u8>>> {
        self.state.get(key)
    }

    fn put(&self, key: &CompositeKey, value: &[u8]) -> StoreResult<()> {
        self.write_batch(&[(key.clone(), value.to_vec())])
    }

    fn scan_prefix(&self, prefix: &CompositeKey) -> StoreResult<KvIter<'_>> {
        self.state.scan_prefix(prefix)
    }

    fn write_batch(&self, batch: &[KeyValue]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let _commit = self.commit.lock().map_err(|_| StoreError::LockPoisoned)?;
        let offset = self.wal.append(&WalRecord {
            writes: batch.to_vec(),
        })?;
        self.state.write_batch(batch)?;
        debug!(offset, writes = batch.len(), "committed batch");
        Ok(())
    }
}

impl std::fmt::Debug for FileLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedgerStore")
            .field("path", &self.wal.path())
            .field("state", &self.state)
            .finish()
    }
}
