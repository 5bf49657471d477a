//! Error types and response handling for the dev server.
//!
//! Every failure a handler can produce maps to one HTTP status and a stable
//! `error_type` string, rendered as a JSON body with a request id.

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::chain::ChainError;
use crate::payment::PaymentError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// No RPC URL was configured when the server started.
    #[error("No RPC endpoint configured (create vx.config.json or pass --rpc)")]
    NoRpc,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The node could not be reached or returned an error.
    #[error("RPC request failed: {0}")]
    Chain(#[from] ChainError),

    #[error("Payment failed: {0}")]
    Payment(#[from] PaymentError),

    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("Server is not bound; call try_bind() before run()")]
    NotBound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Map error variant to appropriate HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NoRpc => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Chain(_) => StatusCode::BAD_GATEWAY,
            ServerError::Payment(e) if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            ServerError::Payment(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidAddress { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::NotBound => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string for JSON responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::NoRpc => "rpc_not_configured",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Chain(_) => "rpc_error",
            ServerError::Payment(_) => "payment_error",
            ServerError::InvalidAddress { .. } => "invalid_address",
            ServerError::NotBound => "not_bound",
            ServerError::Io(_) => "io_error",
        }
    }
}

/// Builder for standardized error responses
pub struct ErrorResponse;

impl ErrorResponse {
    pub fn from_error(err: &ServerError, request_id: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "type": err.error_type(),
                "message": err.to_string(),
                "request_id": request_id
            }
        });

        (
            err.status_code(),
            [(CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::warn!(request_id = %request_id, error_type = self.error_type(), "{}", self);
        ErrorResponse::from_error(&self, &request_id)
    }
}
