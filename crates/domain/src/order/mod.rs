//! Order entity and related types.

mod entity;
mod events;
mod status;
mod value_objects;

pub use entity::{Order, OrderRecord, SETTLEMENT_SUCCESS, validate_order_request};
pub use events::{OrderCreated, PaymentProcessed};
pub use status::OrderStatus;
pub use value_objects::{Money, OrderItem, ProductId};
