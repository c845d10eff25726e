// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod table_api;

// Re-exports
pub use id_provider::{IdProvider, UuidProvider};
pub use table_api::{ApiError, Filter, FilterOp, Order, RowQuery, TableApi};
