use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::OrderId;
use domain::Order;
use tokio::sync::RwLock;

use crate::{OrderStore, Result, StoreError};

#[derive(Debug, Default)]
struct Faults {
    fail_on_create: AtomicBool,
    fail_on_update: AtomicBool,
    fail_on_find: AtomicBool,
    delay_ms: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

/// In-memory order store implementation.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// hooks for injecting failures and latency in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    faults: Arc<Faults>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Returns true if no order is stored.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Makes subsequent `create` calls fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.faults.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `update` calls fail.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.faults.fail_on_update.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `find_by_id` calls fail.
    pub fn set_fail_on_find(&self, fail: bool) {
        self.faults.fail_on_find.store(fail, Ordering::SeqCst);
    }

    /// Delays every call by the given duration before it touches the map.
    pub fn set_delay(&self, delay: Duration) {
        self.faults
            .delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    /// Number of `create` calls received, successful or not.
    pub fn create_count(&self) -> usize {
        self.faults.creates.load(Ordering::SeqCst)
    }

    /// Number of `update` calls received, successful or not.
    pub fn update_count(&self) -> usize {
        self.faults.updates.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay_ms = self.faults.delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms as u64)).await;
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<()> {
        self.faults.creates.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.faults.fail_on_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected create failure".to_string()));
        }

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Err(StoreError::AlreadyExists(order.id()));
        }
        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.simulate_latency().await;

        if self.faults.fail_on_find.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected find failure".to_string()));
        }

        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        self.faults.updates.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.faults.fail_on_update.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }

        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id()) {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(order.id())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{Money, OrderItem, OrderStatus, SETTLEMENT_SUCCESS, UserId};

    fn new_order() -> Order {
        Order::new(
            UserId::new("u1"),
            vec![OrderItem::new("p1", 2, Money::from_cents(999))],
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn create_and_find_order() {
        let store = InMemoryOrderStore::new();
        let order = new_order();

        store.create(&order).await.unwrap();

        let found = store.find_by_id(order.id()).await.unwrap();
        assert_eq!(found, Some(order));
        assert_eq!(store.len().await, 1);
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn find_missing_order_returns_none() {
        let store = InMemoryOrderStore::new();
        let found = store.find_by_id(OrderId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = new_order();

        store.create(&order).await.unwrap();
        let result = store.create(&order).await;

        assert!(matches!(result, Err(StoreError::AlreadyExists(id)) if id == order.id()));
    }

    #[tokio::test]
    async fn update_replaces_the_full_record() {
        let store = InMemoryOrderStore::new();
        let mut order = new_order();
        store.create(&order).await.unwrap();

        order.record_settlement("pay_1", "", SETTLEMENT_SUCCESS, Utc::now());
        store.update(&order).await.unwrap();

        let found = store.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), OrderStatus::Paid);
        assert_eq!(found.payment_id(), Some("pay_1"));
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn update_of_unknown_order_fails() {
        let store = InMemoryOrderStore::new();
        let order = new_order();

        let result = store.update(&order).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let store = InMemoryOrderStore::new();
        let order = new_order();
        store.create(&order).await.unwrap();

        let mut first = order.clone();
        let mut second = order.clone();
        first.record_settlement("pay_1", "", SETTLEMENT_SUCCESS, Utc::now());
        second.record_settlement("pay_2", "", "declined", Utc::now());

        store.update(&first).await.unwrap();
        store.update(&second).await.unwrap();

        let found = store.find_by_id(order.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), OrderStatus::Failed);
        assert_eq!(found.payment_id(), Some("pay_2"));
    }

    #[tokio::test]
    async fn injected_failures() {
        let store = InMemoryOrderStore::new();
        let order = new_order();

        store.set_fail_on_create(true);
        assert!(matches!(
            store.create(&order).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.is_empty().await);

        store.set_fail_on_create(false);
        store.create(&order).await.unwrap();

        store.set_fail_on_update(true);
        assert!(store.update(&order).await.is_err());

        store.set_fail_on_find(true);
        assert!(store.find_by_id(order.id()).await.is_err());
    }
}
