use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all e-store endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route("/v1/init", post(handler::init_handler))
        .route("/v1/invoke", post(handler::invoke_handler))
        .route("/v1/products", post(handler::release_handler))
        .route("/v1/products/unsold", get(handler::unsold_handler))
        .route("/v1/products/:vendor/:name", get(handler::view_handler))
        .route("/v1/products/:vendor/:name/buy", post(handler::buy_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
