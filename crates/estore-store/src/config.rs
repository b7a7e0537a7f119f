use serde::{Deserialize, Serialize};

/// Flush/sync strategy for the file-backed store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every committed batch (safest, highest latency).
    EveryWrite,
    /// Flush to the OS and rely on page-cache buffering.
    #[default]
    OsDefault,
}

/// Configuration for ledger store backends.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub sync_mode: SyncMode,
}

impl StoreConfig {
    /// A configuration that syncs every committed batch to disk.
    pub fn durable() -> Self {
        Self {
            sync_mode: SyncMode::EveryWrite,
        }
    }
}
