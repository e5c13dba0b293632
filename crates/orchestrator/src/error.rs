//! Orchestrator error types.

use common::OrderId;
use order_store::StoreError;
use thiserror::Error;

use crate::services::UnavailableItem;

/// Errors returned by collaborator adapters (inventory, payment).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The call did not reach the service or the connection broke.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered but refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The call did not complete in time.
    #[error("Call timed out")]
    Timeout,
}

/// Errors that can occur during orchestrated order operations.
///
/// Every operation returns either a fully valid order or exactly one of
/// these kinds.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Caller input is malformed (empty user id or no items).
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// The inventory service could not be asked.
    #[error("Stock validation unavailable: {0}")]
    ValidationUnavailable(String),

    /// The inventory service reported one or more items unavailable.
    #[error("Product validation failed: {message}")]
    ProductValidationFailed {
        unavailable: Vec<UnavailableItem>,
        message: String,
    },

    /// No order exists with the given id.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The settlement call itself errored. The order was marked `Failed`
    /// as a side effect before this error was returned.
    #[error("Payment processing failed for order {order_id}: {reason}")]
    PaymentProcessingFailed { order_id: OrderId, reason: String },

    /// The order store was unavailable or rejected the operation. The
    /// persisted state is indeterminate; re-read before retrying.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl OrchestratorError {
    /// Returns a stable name for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestratorError::InvalidOrder(_) => "InvalidOrder",
            OrchestratorError::ValidationUnavailable(_) => "ValidationUnavailable",
            OrchestratorError::ProductValidationFailed { .. } => "ProductValidationFailed",
            OrchestratorError::OrderNotFound(_) => "OrderNotFound",
            OrchestratorError::PaymentProcessingFailed { .. } => "PaymentProcessingFailed",
            OrchestratorError::Storage(_) => "StorageError",
        }
    }
}

/// Convenience type alias for orchestrator results.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
