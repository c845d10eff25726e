// REST adapter errors
// Response and transport failures become ApiError so the queue can classify them

use reqwest::StatusCode;
use serde::Deserialize;
use taskboard_core::port::ApiError;
use thiserror::Error;

/// Adapter construction errors
#[derive(Error, Debug)]
pub enum RestError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Map a non-success response to an ApiError.
///
/// The body's `code` is kept when present, except for 502/503/504 where the
/// status itself is the code: a gateway or unavailable response is transient
/// whatever the body says.
pub fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let status_code = status.as_u16();
    let reason = status.canonical_reason().unwrap_or("HTTP error").to_string();
    let gateway = matches!(status_code, 502..=504);

    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        let message = match body.trim() {
            "" => reason,
            text => text.to_string(),
        };
        return ApiError::with_code(status_code.to_string(), message).status(status_code);
    };

    let code = match parsed.code {
        Some(code) if !gateway => code,
        _ => status_code.to_string(),
    };
    ApiError {
        code: Some(code),
        message: parsed.message.unwrap_or(reason),
        details: parsed.details,
        hint: parsed.hint,
        status: Some(status_code),
    }
}

/// Map a transport failure (no response, or unreadable body) to an ApiError
pub fn error_from_transport(err: &reqwest::Error) -> ApiError {
    let code = if err.is_timeout() {
        Some("ETIMEDOUT")
    } else if err.is_connect() {
        Some("ECONNREFUSED")
    } else if err.is_request() {
        Some("NETWORK_ERROR")
    } else {
        None
    };
    ApiError {
        code: code.map(str::to_string),
        status: err.status().map(|s| s.as_u16()),
        ..ApiError::new(err.to_string())
    }
}
