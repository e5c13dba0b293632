//! Order persistence.
//!
//! The store exclusively owns the persisted representation of an order.
//! Callers hold transient copies for the duration of one operation and
//! write back whole records; there is no compare-and-swap on update.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use store::OrderStore;
