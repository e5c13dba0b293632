use async_trait::async_trait;
use common::OrderId;
use domain::Order;

use crate::Result;

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with `AlreadyExists` if an order with the same id is stored.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by id.
    ///
    /// Returns None if the order doesn't exist; that is not an error.
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Replaces the full stored record of an existing order.
    ///
    /// Last writer wins. Fails with `NotFound` if the order was never created.
    async fn update(&self, order: &Order) -> Result<()>;
}

#[async_trait]
impl<T: OrderStore + ?Sized> OrderStore for std::sync::Arc<T> {
    async fn create(&self, order: &Order) -> Result<()> {
        (**self).create(order).await
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        (**self).find_by_id(order_id).await
    }

    async fn update(&self, order: &Order) -> Result<()> {
        (**self).update(order).await
    }
}
