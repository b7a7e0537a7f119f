use estore_store::{CompositeKey, KeyError, StoreError};
use estore_types::TypeError;

/// Errors produced by contract operations.
///
/// Every error aborts the invocation that raised it; nothing is retried or
/// recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{0} does not exist")]
    NotFound(CompositeKey),

    #[error("{0} is not available for purchase")]
    AlreadyBought(CompositeKey),

    #[error("cannot decode product at {key}: {reason}")]
    Decode { key: CompositeKey, reason: String },

    #[error("cannot encode product: {0}")]
    Encode(String),

    #[error("invalid product key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("ledger error: {0}")]
    Ledger(#[from] StoreError),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {actual}")]
    InvalidArguments {
        function: String,
        expected: usize,
        actual: usize,
    },
}

impl ContractError {
    pub(crate) fn decode(key: &CompositeKey, error: TypeError) -> Self {
        Self::Decode {
            key: key.clone(),
            reason: error.to_string(),
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;
