use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use estore_contract::ContractError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("store error: {0}")]
    Store(#[from] estore_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Contract(e) => match e {
                ContractError::NotFound(_) => StatusCode::NOT_FOUND,
                ContractError::AlreadyBought(_) => StatusCode::CONFLICT,
                ContractError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                ContractError::InvalidKey(_)
                | ContractError::UnknownFunction(_)
                | ContractError::InvalidArguments { .. } => StatusCode::BAD_REQUEST,
                ContractError::Encode(_) | ContractError::Ledger(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Config(_) | Self::Store(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use estore_store::{product_key, StoreError};

    #[test]
    fn contract_errors_map_to_statuses() {
        let key = product_key("apple", "airpods").unwrap();
        let cases = [
            (ContractError::NotFound(key.clone()), StatusCode::NOT_FOUND),
            (ContractError::AlreadyBought(key.clone()), StatusCode::CONFLICT),
            (
                ContractError::Decode {
                    key,
                    reason: "bad".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ContractError::UnknownFunction("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ContractError::Ledger(StoreError::LockPoisoned),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ServerError::from(error).status(), status);
        }
    }

    #[test]
    fn contract_error_message_is_transparent() {
        let key = product_key("apple", "airpods").unwrap();
        let error = ServerError::from(ContractError::NotFound(key.clone()));
        assert_eq!(error.to_string(), format!("{key} does not exist"));
    }
}
