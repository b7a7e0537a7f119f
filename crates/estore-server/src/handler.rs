use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json};
use estore_contract::{Invocation, InvocationRequest};
use estore_store::PRODUCT_NAMESPACE;
use estore_types::{is_truthy, Product};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::ServerResult;
use crate::state::AppState;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Body of `POST /v1/products`.
#[derive(Clone, Debug, Deserialize)]
pub struct ReleaseRequest {
    pub vendor: String,
    pub name: String,
    pub price: String,
    /// Defaults to the vendor.
    #[serde(default)]
    pub owner: Option<String>,
    /// Accepts `true` or `"true"`; anything else is unbought.
    #[serde(default, deserialize_with = "truthy")]
    pub bought: bool,
}

/// Body of `POST /v1/products/:vendor/:name/buy`.
#[derive(Clone, Debug, Deserialize)]
pub struct BuyRequest {
    pub new_owner: String,
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(is_truthy(&Value::deserialize(deserializer)?))
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "estore-server",
        "version": env!("CARGO_PKG_VERSION"),
        "namespace": PRODUCT_NAMESPACE,
    }))
}

pub async fn init_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<Product>>> {
    let seeded = state
        .invoke(|contract, tx| contract.init_ledger(tx))
        .await?;
    Ok(Json(seeded))
}

pub async fn release_handler(
    State(state): State<AppState>,
    Json(request): Json<ReleaseRequest>,
) -> ServerResult<Json<Product>> {
    let product = state
        .invoke(move |contract, tx| {
            let owner = request.owner.as_deref().unwrap_or(&request.vendor);
            contract.release_product(
                tx,
                &request.vendor,
                &request.name,
                &request.price,
                owner,
                request.bought,
            )
        })
        .await?;
    Ok(Json(product))
}

pub async fn buy_handler(
    State(state): State<AppState>,
    Path((vendor, name)): Path<(String, String)>,
    Json(request): Json<BuyRequest>,
) -> ServerResult<Json<Product>> {
    let product = state
        .invoke(move |contract, tx| contract.buy_product(tx, &vendor, &name, &request.new_owner))
        .await?;
    Ok(Json(product))
}

/// Returns the stored record body untouched.
pub async fn view_handler(
    State(state): State<AppState>,
    Path((vendor, name)): Path<(String, String)>,
) -> ServerResult<impl IntoResponse> {
    let raw = state
        .query(move |contract, view| contract.view_product(view, &vendor, &name))
        .await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], raw))
}

pub async fn unsold_handler(State(state): State<AppState>) -> ServerResult<Json<Vec<Product>>> {
    let unsold = state
        .query(|contract, view| contract.view_unsold_products(view))
        .await?;
    Ok(Json(unsold))
}

/// Generic by-name invocation: `{"function": "...", "args": [...]}`.
pub async fn invoke_handler(
    State(state): State<AppState>,
    Json(request): Json<InvocationRequest>,
) -> ServerResult<Json<Value>> {
    let invocation = Invocation::try_from(&request)?;
    tracing::debug!(
        function = invocation.function(),
        read_only = invocation.is_read_only(),
        "invoke"
    );
    let payload = if invocation.is_read_only() {
        state
            .query(move |contract, view| contract.invoke(view, &invocation))
            .await?
    } else {
        state
            .invoke(move |contract, tx| contract.invoke(tx, &invocation))
            .await?
    };
    Ok(Json(payload))
}
