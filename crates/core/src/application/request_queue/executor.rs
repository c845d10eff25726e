// Executor - runs attempts, retries in place, settles the caller
use super::admission::SlotId;
use super::handle::Completion;
use super::panic_guard::{call_guarded, describe_join_error};
use super::Shared;
use crate::application::retry::RetryDecision;
use crate::domain::{Classify, QueueError, RequestId, RetryState};
use futures::future::BoxFuture;
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

/// Zero-argument unit of work, invoked once per attempt
pub(super) type Operation<T, E> = Box<dyn FnMut() -> BoxFuture<'static, Result<T, E>> + Send>;

/// Type-erased view of a request sitting in the waiting list
pub(super) trait PendingRequest: Send {
    /// Begin executing in the given running slot
    fn start(self: Box<Self>, shared: Arc<Shared>, slot: SlotId);

    /// Settle with `QueueError::Cleared` without ever running
    fn cancel(self: Box<Self>);
}

/// One submitted unit of work
pub(super) struct QueuedRequest<T, E> {
    id: RequestId,
    operation: Operation<T, E>,
    completion: Completion<T, E>,
    retry: RetryState,
}

impl<T, E> QueuedRequest<T, E>
where
    T: Send + 'static,
    E: Classify + Display + Send + 'static,
{
    pub(super) fn new(
        id: RequestId,
        operation: Operation<T, E>,
        completion: Completion<T, E>,
        max_retries: u32,
    ) -> Self {
        Self {
            id,
            operation,
            completion,
            retry: RetryState::new(max_retries),
        }
    }

    /// Attempt loop. The slot stays occupied across backoff sleeps and is
    /// released only when the request settles.
    async fn run(mut self, shared: Arc<Shared>, slot: SlotId) {
        loop {
            let started = Instant::now();
            // The operation may panic while building its future, before any task exists
            let future = match call_guarded(|| (self.operation)()) {
                Ok(future) => future,
                Err(msg) => {
                    error!(request_id = %self.id, panic_msg = %msg, "Request operation panicked");
                    self.settle(&shared, slot, Err(QueueError::Panicked(msg)));
                    return;
                }
            };
            // Each attempt runs as its own task so a panic is caught by the JoinHandle
            let attempt = tokio::spawn(future).await;
            let elapsed = started.elapsed();
            let elapsed_ms = elapsed.as_millis() as u64;

            let err = match attempt {
                Ok(Ok(value)) => {
                    if shared.config.log_slow_requests
                        && elapsed_ms > shared.config.slow_request_threshold_ms
                    {
                        warn!(
                            request_id = %self.id,
                            elapsed_ms,
                            threshold_ms = shared.config.slow_request_threshold_ms,
                            "Slow request"
                        );
                    }
                    debug!(request_id = %self.id, elapsed_ms, attempt = self.retry.attempt(), "Request succeeded");
                    self.settle(&shared, slot, Ok(value));
                    return;
                }
                Ok(Err(err)) => err,
                Err(join_err) => {
                    let msg = describe_join_error(join_err);
                    error!(request_id = %self.id, panic_msg = %msg, "Request attempt panicked");
                    self.settle(&shared, slot, Err(QueueError::Panicked(msg)));
                    return;
                }
            };

            let class = err.classify();
            match shared.retry_policy.should_retry(&self.retry, class) {
                RetryDecision::Retry(delay) => {
                    shared.retry_policy.prepare_for_retry(&mut self.retry);
                    warn!(
                        request_id = %self.id,
                        attempt = self.retry.retry_count,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        class = %class,
                        error = %err,
                        "Retrying request after transient failure"
                    );
                    sleep(delay).await;
                }
                RetryDecision::Failed(reason) => {
                    if shared.config.log_slow_requests {
                        error!(
                            request_id = %self.id,
                            attempts = self.retry.attempt(),
                            elapsed_ms,
                            reason = ?reason,
                            error = %err,
                            "Request failed"
                        );
                    }
                    self.settle(&shared, slot, Err(QueueError::Failed(err)));
                    return;
                }
            }
        }
    }

    /// Release the slot, deliver the outcome, then let the next request in
    fn settle(self, shared: &Arc<Shared>, slot: SlotId, outcome: Result<T, QueueError<E>>) {
        shared.release(slot);
        if self.completion.send(outcome).is_err() {
            debug!(request_id = %self.id, "Caller dropped handle before completion");
        }
        shared.promote();
    }
}

impl<T, E> PendingRequest for QueuedRequest<T, E>
where
    T: Send + 'static,
    E: Classify + Display + Send + 'static,
{
    fn start(self: Box<Self>, shared: Arc<Shared>, slot: SlotId) {
        tokio::spawn((*self).run(shared, slot));
    }

    fn cancel(self: Box<Self>) {
        let _ = self.completion.send(Err(QueueError::Cleared));
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::QueueConfig;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::ApiError;
    use crate::RequestQueue;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tracing::subscriber::DefaultGuard;

    /// In-memory log sink shared with the fmt subscriber
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    /// Capture logs for the current thread (tests run on a current-thread runtime)
    fn capture_logs() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn queue(log_slow_requests: bool) -> RequestQueue {
        let config = QueueConfig {
            log_slow_requests,
            slow_request_threshold_ms: 1000,
            ..Default::default()
        };
        RequestQueue::new(config, Arc::new(SequentialIdProvider::new("log"))).unwrap()
    }

    async fn run_taking(queue: &RequestQueue, millis: u64) {
        queue
            .enqueue(move || async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Ok::<_, ApiError>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_warned_above_threshold() {
        let (logs, _guard) = capture_logs();
        run_taking(&queue(true), 1500).await;

        let output = logs.contents();
        assert!(output.contains("Slow request"), "logs: {}", output);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_request_not_warned() {
        let (logs, _guard) = capture_logs();
        run_taking(&queue(true), 500).await;

        assert!(!logs.contents().contains("Slow request"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_warning_disabled_by_flag() {
        let (logs, _guard) = capture_logs();
        run_taking(&queue(false), 1500).await;

        assert!(!logs.contents().contains("Slow request"));
    }

    #[tokio::test]
    async fn test_fatal_failure_logged_only_when_enabled() {
        let (logs, _guard) = capture_logs();
        let fail = || async { Err::<(), _>(ApiError::with_code("400", "Bad Request")) };

        assert!(queue(true).enqueue(fail).await.is_err());
        assert!(logs.contents().contains("Request failed"));

        let (quiet_logs, _quiet_guard) = capture_logs();
        assert!(queue(false).enqueue(fail).await.is_err());
        assert!(!quiet_logs.contents().contains("Request failed"));
    }
}
