// Taskboard Infrastructure - REST Adapter
// Implements: TableApi over a PostgREST-style HTTP API

mod client;
mod error;
mod query;

pub use client::{RestConfig, RestTableApi, DEFAULT_HTTP_TIMEOUT_MS};
pub use error::{error_from_response, error_from_transport, RestError};
pub use query::{filter_pairs, parse_content_range, select_pairs};
