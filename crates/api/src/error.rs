//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_store::StoreError;
use orchestrator::{OrchestratorError, ServiceError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order workflow error.
    Orchestrator(OrchestratorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": msg, "kind": "OrderNotFound" }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg, "kind": "InvalidOrder" }),
            ),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, serde_json::Value) {
    let kind = err.kind();
    let message = err.to_string();

    match err {
        OrchestratorError::InvalidOrder(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": message, "kind": kind }),
        ),
        OrchestratorError::ProductValidationFailed { unavailable, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({ "error": message, "kind": kind, "unavailable": unavailable }),
        ),
        OrchestratorError::OrderNotFound(_) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": message, "kind": kind }),
        ),
        OrchestratorError::PaymentProcessingFailed { order_id, .. } => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({ "error": message, "kind": kind, "order_id": order_id }),
        ),
        OrchestratorError::ValidationUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({ "error": message, "kind": kind }),
        ),
        OrchestratorError::Storage(_) => {
            tracing::error!(error = %message, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": message, "kind": kind }),
            )
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}

/// Failures while wiring the application at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Order store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("Collaborator client setup failed: {0}")]
    Service(#[from] ServiceError),
}
