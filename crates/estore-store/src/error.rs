use crate::key::CompositeKey;

/// Errors from building or parsing composite keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The namespace tag of a composite key was empty.
    #[error("composite key object type must not be empty")]
    EmptyObjectType,

    /// A key component contained the separator or the reserved code point.
    #[error("invalid character {ch:?} in composite key component {component:?}")]
    InvalidCharacter { component: String, ch: char },

    /// A raw key did not follow the composite key layout.
    #[error("malformed composite key: {0}")]
    Malformed(String),
}

/// Errors from ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// A write was attempted through a read-only view.
    #[error("write to {0} rejected: ledger view is read-only")]
    ReadOnly(CompositeKey),

    /// A key could not be built or decoded.
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
