//! Domain error types.

use thiserror::Error;

/// Errors raised while building or mutating an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// User ID is required.
    #[error("User ID is required")]
    UserIdRequired,

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// The order total does not fit in a cent amount.
    #[error("Order total is too large")]
    TotalOverflow,
}
