//! Order entity.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

use super::{Money, OrderItem, OrderStatus};

/// Settlement outcome reported by the payment processor on success.
///
/// Any other outcome value is treated as a non-successful settlement.
pub const SETTLEMENT_SUCCESS: &str = "success";

/// Checks the request-level invariants of a new order.
///
/// The owner, the presence of items and a representable total are checked
/// here; per-item quantity and price sanity belong to the inventory side and
/// the caller.
pub fn validate_order_request(user_id: &UserId, items: &[OrderItem]) -> Result<(), OrderError> {
    if user_id.is_empty() {
        return Err(OrderError::UserIdRequired);
    }
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }
    order_total(items).map(|_| ())
}

/// Sums the line totals in exact integer cents.
fn order_total(items: &[OrderItem]) -> Result<Money, OrderError> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| {
            item.total_price().and_then(|line| acc.checked_add(line))
        })
        .ok_or(OrderError::TotalOverflow)
}

/// A customer order.
///
/// `id`, `user_id`, `items` and `total` are fixed at creation. Only the
/// status, the payment fields and `updated_at` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    items: Vec<OrderItem>,
    total: Money,
    status: OrderStatus,
    payment_id: Option<String>,
    payment_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new pending order with a fresh identifier.
    ///
    /// The total is computed once here from the caller-supplied unit prices.
    pub fn new(
        user_id: UserId,
        items: Vec<OrderItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        validate_order_request(&user_id, &items)?;
        let total = order_total(&items)?;

        Ok(Self {
            id: OrderId::new(),
            user_id,
            items,
            total,
            status: OrderStatus::Pending,
            payment_id: None,
            payment_url: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_id(&self) -> Option<&str> {
        self.payment_id.as_deref()
    }

    pub fn payment_url(&self) -> Option<&str> {
        self.payment_url.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records the result of a settlement call that returned a response.
    ///
    /// The payment id and url are kept whatever the outcome. The order becomes
    /// `Paid` only when `outcome` is exactly [`SETTLEMENT_SUCCESS`].
    pub fn record_settlement(
        &mut self,
        payment_id: impl Into<String>,
        payment_url: impl Into<String>,
        outcome: &str,
        now: DateTime<Utc>,
    ) {
        self.payment_id = Some(payment_id.into()).filter(|s: &String| !s.is_empty());
        self.payment_url = Some(payment_url.into()).filter(|s: &String| !s.is_empty());
        self.status = if outcome == SETTLEMENT_SUCCESS {
            OrderStatus::Paid
        } else {
            OrderStatus::Failed
        };
        self.updated_at = now;
    }

    /// Marks the order failed without touching the payment fields.
    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.status = OrderStatus::Failed;
        self.updated_at = now;
    }
}

/// Flat persisted form of an [`Order`].
///
/// Storage backends read and write this shape; converting back into an
/// `Order` does not re-run creation checks or recompute the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderRecord> for Order {
    fn from(r: OrderRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            items: r.items,
            total: r.total,
            status: r.status,
            payment_id: r.payment_id,
            payment_url: r.payment_url,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<&Order> for OrderRecord {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id.clone(),
            items: o.items.clone(),
            total: o.total,
            status: o.status,
            payment_id: o.payment_id.clone(),
            payment_url: o.payment_url.clone(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}
