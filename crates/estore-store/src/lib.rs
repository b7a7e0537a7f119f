//! Ledger access for the e-store.
//!
//! The store contract never touches storage directly. It reads and writes
//! through the [`LedgerStore`] trait, which any transactional key-value
//! backend can implement. This crate provides that trait, the composite key
//! codec every contract operation uses, and the backends shipped with the
//! workspace.
//!
//! # Storage Backends
//!
//! - [`InMemoryLedgerStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileLedgerStore`] -- write-ahead-log store that survives restarts
//!
//! # Transactions
//!
//! [`Ledger`] wraps a backend and runs each invocation inside a
//! [`TxContext`]: writes are buffered, visible to later reads in the same
//! invocation, and committed as one batch only if the invocation succeeds.
//! [`Ledger::query`] runs a read-only invocation against committed state
//! through a [`ReadOnlyView`].
//!
//! # Design Rules
//!
//! 1. Keys are composite keys; raw strings never reach a backend.
//! 2. Scans are ordered by key and finite.
//! 3. A batch is applied entirely or not at all.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod file;
pub mod key;
pub mod ledger;
pub mod memory;
pub mod traits;
pub mod wal;

// Re-export primary types at crate root for ergonomic imports.
pub use config::{StoreConfig, SyncMode};
pub use error::{KeyError, StoreError, StoreResult};
pub use file::FileLedgerStore;
pub use key::{product_key, products_prefix, vendor_prefix, CompositeKey, PRODUCT_NAMESPACE};
pub use ledger::{Ledger, ReadOnlyView, TxContext};
pub use memory::InMemoryLedgerStore;
pub use traits::{KeyValue, KvIter, LedgerStore};
