//! HTTP server for the e-store ledger.
//!
//! Exposes each contract operation as a REST endpoint plus a generic
//! by-name `/v1/invoke`. Every request runs as one ledger transaction.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{BuyRequest, HealthResponse, ReleaseRequest};
pub use server::EStoreServer;
pub use state::AppState;
