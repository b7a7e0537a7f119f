use std::sync::Arc;

use estore_contract::{ContractResult, EStoreContract};
use estore_store::{InMemoryLedgerStore, Ledger, LedgerStore, ReadOnlyView, TxContext};

use crate::error::{ServerError, ServerResult};

/// Shared handler state: one ledger and the contract that runs against it.
#[derive(Clone)]
pub struct AppState {
    ledger: Arc<Ledger<Box<dyn LedgerStore>>>,
    contract: EStoreContract,
}

impl AppState {
    pub fn new(store: Box<dyn LedgerStore>) -> Self {
        Self {
            ledger: Arc::new(Ledger::new(store)),
            contract: EStoreContract::new(),
        }
    }

    /// State backed by a fresh in-memory ledger.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryLedgerStore::new()))
    }

    /// Run one contract invocation as a ledger transaction.
    ///
    /// The transaction blocks on the ledger lock and store I/O, so it runs on
    /// the blocking pool.
    pub async fn invoke<T, F>(&self, operation: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&EStoreContract, &TxContext<'_>) -> ContractResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        let contract = self.contract;
        let result = tokio::task::spawn_blocking(move || {
            ledger.transact(|tx| operation(&contract, tx))
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(result?)
    }

    /// Run a read-only contract invocation against committed state.
    pub async fn query<T, F>(&self, operation: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&EStoreContract, &ReadOnlyView<'_>) -> ContractResult<T> + Send + 'static,
    {
        let ledger = Arc::clone(&self.ledger);
        let contract = self.contract;
        let result = tokio::task::spawn_blocking(move || {
            ledger.query(|view| operation(&contract, view))
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
        Ok(result?)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
