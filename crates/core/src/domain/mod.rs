// Domain Layer - Queue entities and error taxonomy

pub mod error;
pub mod queue;
pub mod request;
pub mod table;

// Re-exports
pub use error::{classify, Classify, ErrorClass, QueueError};
pub use queue::{QueueConfig, QueueStats};
pub use request::{RequestId, RetryState};
pub use table::Table;
