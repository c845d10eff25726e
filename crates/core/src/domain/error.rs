// Request Error Taxonomy

use thiserror::Error;

/// Structured codes treated as timeouts
pub const TIMEOUT_CODES: &[&str] = &["PGRST301", "ETIMEDOUT", "TIMEOUT"];

/// Structured codes treated as network failures
pub const NETWORK_CODES: &[&str] = &["ECONNRESET", "ECONNREFUSED", "ENOTFOUND", "NETWORK_ERROR"];

/// HTTP-style server codes treated as temporary unavailability
pub const SERVER_UNAVAILABLE_CODES: &[&str] = &["500", "502", "503", "504"];

/// Message fragments that mark an uncoded error as transport-level
pub const TRANSPORT_MESSAGE_HINTS: &[&str] = &[
    "network",
    "timeout",
    "connection",
    "fetch",
    "econnreset",
    "etimedout",
];

/// Closed set of failure categories seen by the retry scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Coded timeout
    Timeout,
    /// Coded network failure
    Network,
    /// Coded 500/502/503/504
    ServerUnavailable,
    /// Uncoded error whose message names a transport problem
    Transport,
    /// Anything else (never retried)
    Other,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Other)
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorClass::Timeout => write!(f, "TIMEOUT"),
            ErrorClass::Network => write!(f, "NETWORK"),
            ErrorClass::ServerUnavailable => write!(f, "SERVER_UNAVAILABLE"),
            ErrorClass::Transport => write!(f, "TRANSPORT"),
            ErrorClass::Other => write!(f, "OTHER"),
        }
    }
}

/// Classify an error from its structured code and message.
///
/// A present code decides alone: a coded error outside the retryable sets is
/// `Other` even if its message mentions the network. The message is only
/// consulted when there is no code.
pub fn classify(code: Option<&str>, message: &str) -> ErrorClass {
    if let Some(code) = code {
        let code = code.trim();
        let matches = |set: &[&str]| set.iter().any(|c| c.eq_ignore_ascii_case(code));
        return if matches(TIMEOUT_CODES) {
            ErrorClass::Timeout
        } else if matches(NETWORK_CODES) {
            ErrorClass::Network
        } else if matches(SERVER_UNAVAILABLE_CODES) {
            ErrorClass::ServerUnavailable
        } else {
            ErrorClass::Other
        };
    }

    let message = message.to_ascii_lowercase();
    if TRANSPORT_MESSAGE_HINTS
        .iter()
        .any(|hint| message.contains(hint))
    {
        ErrorClass::Transport
    } else {
        ErrorClass::Other
    }
}

/// Errors that can flow through the request queue.
///
/// Implementors expose their code and message; the queue only ever looks at
/// the resulting `ErrorClass`.
pub trait Classify {
    /// Structured error code, if the error carries one
    fn error_code(&self) -> Option<&str>;

    /// Human readable message
    fn error_message(&self) -> String;

    fn classify(&self) -> ErrorClass {
        classify(self.error_code(), &self.error_message())
    }
}

impl Classify for std::io::Error {
    fn error_code(&self) -> Option<&str> {
        use std::io::ErrorKind;
        match self.kind() {
            ErrorKind::TimedOut => Some("ETIMEDOUT"),
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => Some("ECONNRESET"),
            ErrorKind::ConnectionRefused => Some("ECONNREFUSED"),
            _ => None,
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }
}

/// Failure delivered through a `RequestHandle`
#[derive(Error, Debug)]
pub enum QueueError<E> {
    /// The operation failed fatally or ran out of retries; original error
    #[error("{0}")]
    Failed(E),

    /// Removed by `RequestQueue::clear` before it started
    #[error("Queue cleared")]
    Cleared,

    /// The operation panicked during an attempt
    #[error("Request panicked: {0}")]
    Panicked(String),

    /// The queue task was dropped before settling (runtime shutdown)
    #[error("Request abandoned before completion")]
    Abandoned,
}

impl<E> QueueError<E> {
    /// Original operation error, if this is a `Failed`
    pub fn into_inner(self) -> Option<E> {
        match self {
            QueueError::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, QueueError::Cleared)
    }
}
