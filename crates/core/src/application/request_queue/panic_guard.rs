// Panic isolation for request attempts
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::task::JoinError;

/// Run a synchronous call with panic isolation; a panic becomes its message
pub(super) fn call_guarded<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(panic_message)
}

/// Describe why a spawned attempt ended without producing a result
pub(super) fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic())
    } else {
        "Attempt cancelled".to_string()
    }
}

/// Extract a readable message from a panic payload
pub(super) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
