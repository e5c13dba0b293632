//! Integration events published on order state changes.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

use super::{Money, Order, OrderItem, OrderStatus};

/// Published after a new order has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// The unique order ID.
    pub order_id: OrderId,

    /// The user who owns the order.
    pub user_id: UserId,

    /// Items as supplied at creation.
    pub items: Vec<OrderItem>,

    /// Order total in cents.
    #[serde(rename = "total_cents")]
    pub total: Money,

    /// When the order was created.
    pub created_at: DateTime<Utc>,
}

impl OrderCreated {
    pub const TOPIC: &'static str = "order.created";

    /// Builds the event from a freshly persisted order.
    pub fn from_order(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            user_id: order.user_id().clone(),
            items: order.items().to_vec(),
            total: order.total(),
            created_at: order.created_at(),
        }
    }
}

impl DomainEvent for OrderCreated {
    fn topic(&self) -> &'static str {
        Self::TOPIC
    }

    fn event_type(&self) -> &'static str {
        "OrderCreated"
    }
}

/// Published after a settlement result has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProcessed {
    /// The order that was settled.
    pub order_id: OrderId,

    /// Payment identifier returned by the processor.
    pub payment_id: String,

    /// Outcome string exactly as reported by the processor.
    pub status: String,

    /// Resulting order status.
    pub order_status: OrderStatus,

    /// Amount charged in cents.
    #[serde(rename = "amount_cents")]
    pub amount: Money,

    /// When the settlement result was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl PaymentProcessed {
    pub const TOPIC: &'static str = "payment.processed";

    /// Builds the event from a settled order and the processor's raw outcome.
    pub fn from_order(order: &Order, outcome: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id(),
            payment_id: order.payment_id().unwrap_or_default().to_string(),
            status: outcome.into(),
            order_status: order.status(),
            amount: order.total(),
            occurred_at,
        }
    }
}

impl DomainEvent for PaymentProcessed {
    fn topic(&self) -> &'static str {
        Self::TOPIC
    }

    fn event_type(&self) -> &'static str {
        "PaymentProcessed"
    }
}
