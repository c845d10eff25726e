// Application Layer - Request queue and services built on it

pub mod request_queue;
pub mod retry;
pub mod table_service;

// Re-exports
pub use request_queue::{RequestHandle, RequestQueue};
pub use retry::{FailReason, RetryDecision, RetryPolicy};
pub use table_service::TableService;
