use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update targeted an order that was never created.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A create targeted an identifier that is already taken.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The backend could not be reached or did not answer in time.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped back into an order.
    #[error("Corrupt record for order {order_id}: {reason}")]
    CorruptRecord { order_id: String, reason: String },
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
