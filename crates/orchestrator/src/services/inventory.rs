//! Inventory validator trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use domain::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Message reported when at least one item cannot be fulfilled.
pub const UNAVAILABLE_MESSAGE: &str = "some products are unavailable or out of stock";

/// A quantity of one product to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A product that cannot be supplied in the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableItem {
    pub product_id: ProductId,
    /// Quantity actually in stock (0 for unknown products).
    pub available: u32,
}

/// Outcome of a batched stock check. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockValidation {
    pub valid: bool,
    #[serde(default)]
    pub unavailable: Vec<UnavailableItem>,
    #[serde(default)]
    pub message: String,
}

impl StockValidation {
    /// Returns true if every item was reported available.
    pub fn all_available(&self) -> bool {
        self.valid && self.unavailable.is_empty()
    }
}

/// Trait for the inventory side's stock check.
///
/// The check is read-only: nothing is reserved or decremented.
#[async_trait]
pub trait InventoryValidator: Send + Sync {
    /// Checks all requested quantities in one call.
    async fn validate(&self, items: Vec<StockRequest>) -> Result<StockValidation, ServiceError>;
}

#[async_trait]
impl<T: InventoryValidator + ?Sized> InventoryValidator for Arc<T> {
    async fn validate(&self, items: Vec<StockRequest>) -> Result<StockValidation, ServiceError> {
        (**self).validate(items).await
    }
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    stock: HashMap<ProductId, u32>,
    fail: bool,
    delay: Option<Duration>,
}

/// In-memory inventory validator backed by a stock catalog.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryValidator {
    state: Arc<Mutex<InMemoryInventoryState>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryInventoryValidator {
    /// Creates a validator with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator seeded with the given stock levels.
    pub fn with_stock<I, P>(stock: I) -> Self
    where
        I: IntoIterator<Item = (P, u32)>,
        P: Into<ProductId>,
    {
        let validator = Self::new();
        for (product_id, quantity) in stock {
            validator.set_stock(product_id, quantity);
        }
        validator
    }

    /// Sets the stock level of a product.
    pub fn set_stock(&self, product_id: impl Into<ProductId>, quantity: u32) {
        self.lock().stock.insert(product_id.into(), quantity);
    }

    /// Configures the validator to fail every call at the transport level.
    pub fn set_fail(&self, fail: bool) {
        self.lock().fail = fail;
    }

    /// Delays every answer by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Returns the number of validate calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryInventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl InventoryValidator for InMemoryInventoryValidator {
    async fn validate(&self, items: Vec<StockRequest>) -> Result<StockValidation, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.lock();
        if state.fail {
            return Err(ServiceError::Transport(
                "inventory service unreachable".to_string(),
            ));
        }

        if let Some(item) = items.iter().find(|item| item.quantity == 0) {
            return Err(ServiceError::Rejected(format!(
                "invalid stock quantity for {}",
                item.product_id
            )));
        }

        let unavailable: Vec<UnavailableItem> = items
            .iter()
            .filter_map(|item| match state.stock.get(&item.product_id) {
                Some(&available) if available >= item.quantity => None,
                Some(&available) => Some(UnavailableItem {
                    product_id: item.product_id.clone(),
                    available,
                }),
                None => Some(UnavailableItem {
                    product_id: item.product_id.clone(),
                    available: 0,
                }),
            })
            .collect();

        let valid = unavailable.is_empty();
        Ok(StockValidation {
            valid,
            unavailable,
            message: if valid {
                String::new()
            } else {
                UNAVAILABLE_MESSAGE.to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(product_id: &str, quantity: u32) -> StockRequest {
        StockRequest {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_all_items_in_stock() {
        let validator = InMemoryInventoryValidator::with_stock([("p1", 5), ("p2", 1)]);

        let result = validator
            .validate(vec![request("p1", 5), request("p2", 1)])
            .await
            .unwrap();

        assert!(result.valid);
        assert!(result.all_available());
        assert!(result.message.is_empty());
        assert_eq!(validator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_and_missing_items_are_reported() {
        let validator = InMemoryInventoryValidator::with_stock([("p1", 1)]);

        let result = validator
            .validate(vec![request("p1", 2), request("ghost", 1)])
            .await
            .unwrap();

        assert!(!result.valid);
        assert_eq!(result.message, UNAVAILABLE_MESSAGE);
        assert_eq!(
            result.unavailable,
            vec![
                UnavailableItem {
                    product_id: ProductId::new("p1"),
                    available: 1
                },
                UnavailableItem {
                    product_id: ProductId::new("ghost"),
                    available: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_quantity_is_rejected() {
        let validator = InMemoryInventoryValidator::with_stock([("p1", 10)]);
        let result = validator.validate(vec![request("p1", 0)]).await;
        assert!(matches!(result, Err(ServiceError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_fail_flag() {
        let validator = InMemoryInventoryValidator::with_stock([("p1", 10)]);
        validator.set_fail(true);

        let result = validator.validate(vec![request("p1", 1)]).await;
        assert!(matches!(result, Err(ServiceError::Transport(_))));
    }

    #[tokio::test]
    async fn test_stock_is_not_decremented() {
        let validator = InMemoryInventoryValidator::with_stock([("p1", 2)]);

        for _ in 0..3 {
            let result = validator.validate(vec![request("p1", 2)]).await.unwrap();
            assert!(result.valid);
        }
    }
}
