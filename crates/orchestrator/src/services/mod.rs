//! Collaborator service traits with in-memory and HTTP implementations.

pub mod http;
pub mod inventory;
pub mod payment;

pub use http::{HttpInventoryValidator, HttpPaymentProcessor};
pub use inventory::{
    InMemoryInventoryValidator, InventoryValidator, StockRequest, StockValidation,
    UnavailableItem,
};
pub use payment::{InMemoryPaymentProcessor, PaymentProcessor, PaymentRequest, PaymentResponse};
