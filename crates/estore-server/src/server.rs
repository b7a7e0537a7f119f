use estore_store::{FileLedgerStore, InMemoryLedgerStore, LedgerStore};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// E-store HTTP server.
pub struct EStoreServer {
    config: ServerConfig,
    state: AppState,
}

impl EStoreServer {
    /// Open the configured ledger and prepare the server.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store: Box<dyn LedgerStore> = match &config.data_path {
            Some(path) => Box::new(FileLedgerStore::open(path, &config.store)?),
            None => Box::new(InMemoryLedgerStore::new()),
        };
        Ok(Self::with_state(config, AppState::new(store)))
    }

    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            data = ?self.config.data_path,
            "e-store server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = EStoreServer::new(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8040".parse().unwrap());
    }

    #[test]
    fn file_backed_server() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_path: Some(dir.path().join("ledger.wal")),
            ..ServerConfig::default()
        };
        let server = EStoreServer::new(config).unwrap();
        let _router = server.router();
        assert!(dir.path().join("ledger.wal").exists());
    }
}
