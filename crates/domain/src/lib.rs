//! Domain layer for the order orchestration system.
//!
//! This crate provides the core domain types including:
//! - The `Order` entity with its immutable item list and derived total
//! - The `OrderStatus` state machine
//! - Integration events published on order state changes

pub mod error;
pub mod event;
pub mod order;

pub use common::{OrderId, UserId};
pub use error::OrderError;
pub use event::DomainEvent;
pub use order::{
    Money, Order, OrderCreated, OrderItem, OrderRecord, OrderStatus, PaymentProcessed, ProductId,
    SETTLEMENT_SUCCESS, validate_order_request,
};
