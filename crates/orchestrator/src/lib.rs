//! Order orchestration workflow.
//!
//! This crate drives an order through its lifecycle across three
//! independently owned services:
//! 1. Validate stock with the inventory service (batched, read-only)
//! 2. Persist the order as `Pending`
//! 3. Settle it with the payment processor and persist `Paid` or `Failed`
//!
//! Each state change that commits is followed by a fire-and-forget event
//! handed to a background dispatcher. There is no compensation and no
//! internal retry: every collaborator failure surfaces to the caller.

pub mod config;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod services;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, ServiceError};
pub use events::{
    EventDispatcher, EventMessage, EventPublisher, InMemoryEventPublisher, PublishError,
    TracingEventPublisher,
};
pub use orchestrator::OrderOrchestrator;
pub use services::{
    HttpInventoryValidator, HttpPaymentProcessor, InMemoryInventoryValidator,
    InMemoryPaymentProcessor, InventoryValidator, PaymentProcessor, PaymentRequest,
    PaymentResponse, StockRequest, StockValidation, UnavailableItem,
};
