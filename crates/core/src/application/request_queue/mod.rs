// Request Queue - bounded admission, FIFO waiting list, retry in place

mod admission;
mod executor;
mod handle;
mod panic_guard;

pub use handle::RequestHandle;

use crate::application::retry::RetryPolicy;
use crate::domain::{Classify, QueueConfig, QueueStats, RequestId};
use crate::error::Result;
use crate::port::IdProvider;
use admission::{Admission, Admitted, SlotId};
use executor::{Operation, PendingRequest, QueuedRequest};
use futures::FutureExt;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// State shared between the queue and its in-flight request tasks
pub(crate) struct Shared {
    config: QueueConfig,
    retry_policy: RetryPolicy,
    admission: Mutex<Admission<Box<dyn PendingRequest>>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Admission<Box<dyn PendingRequest>>> {
        // Bookkeeping never panics mid-update, so a poisoned lock is still consistent
        self.admission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start waiting requests while slots are free. Safe to call redundantly.
    fn promote(self: &Arc<Self>) {
        loop {
            let admitted = self.lock().admit_next();
            let Some(Admitted { slot, id, request }) = admitted else {
                break;
            };
            debug!(request_id = %id, slot, "Request started");
            request.start(Arc::clone(self), slot);
        }
    }

    fn release(&self, slot: SlotId) {
        if self.lock().release(slot).is_none() {
            warn!(slot, "Released a slot that was not running");
        }
    }
}

/// Bounded-concurrency request queue with retry and exponential backoff.
///
/// Every remote call goes through `enqueue`. At most `max_concurrent`
/// requests run at once; the rest wait in submission order. Transient
/// failures are retried in place (the request keeps its slot while it backs
/// off); fatal failures and exhausted retries are handed back unchanged.
///
/// Construct one instance in the composition root and share it by `Arc`.
pub struct RequestQueue {
    shared: Arc<Shared>,
    id_provider: Arc<dyn IdProvider>,
}

impl RequestQueue {
    /// Create a queue; fails if the configuration is unusable
    pub fn new(config: QueueConfig, id_provider: Arc<dyn IdProvider>) -> Result<Self> {
        config.validate()?;
        info!(
            max_concurrent = config.max_concurrent,
            max_retries = config.max_retries,
            retry_delay_base_ms = config.retry_delay_base_ms,
            "Request queue created"
        );
        Ok(Self {
            shared: Arc::new(Shared {
                retry_policy: RetryPolicy::new(config.retry_delay_base_ms),
                admission: Mutex::new(Admission::new(config.max_concurrent)),
                config,
            }),
            id_provider,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Submit an operation under a freshly generated id.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn enqueue<T, E, F, Fut>(&self, operation: F) -> RequestHandle<T, E>
    where
        T: Send + 'static,
        E: Classify + Display + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let id = self.id_provider.generate_id();
        self.enqueue_with_id(id, operation)
    }

    /// Submit an operation under a caller-chosen id (collisions allowed).
    ///
    /// The operation is invoked once per attempt and never concurrently with
    /// itself. The returned handle settles exactly once.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn enqueue_with_id<T, E, F, Fut>(
        &self,
        id: impl Into<RequestId>,
        mut operation: F,
    ) -> RequestHandle<T, E>
    where
        T: Send + 'static,
        E: Classify + Display + Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let id = id.into();
        let (completion, handle) = RequestHandle::channel(id.clone());
        let operation: Operation<T, E> = Box::new(move || operation().boxed());
        let request: Box<dyn PendingRequest> = Box::new(QueuedRequest::new(
            id.clone(),
            operation,
            completion,
            self.shared.config.max_retries,
        ));

        let waiting = {
            let mut admission = self.shared.lock();
            admission.push(id.clone(), request);
            admission.waiting_len()
        };
        debug!(request_id = %id, waiting, "Request enqueued");

        self.shared.promote();
        handle
    }

    /// Reject every waiting request with `QueueError::Cleared`.
    ///
    /// Running requests, including those backing off before a retry, are
    /// not affected. Returns how many requests were rejected.
    pub fn clear(&self) -> usize {
        let drained = self.shared.lock().drain_waiting();
        let count = drained.len();
        for (id, request) in drained {
            debug!(request_id = %id, "Request cleared before start");
            request.cancel();
        }
        if count > 0 {
            info!(cleared = count, "Queue cleared");
        }
        count
    }

    /// Point-in-time occupancy snapshot
    pub fn stats(&self) -> QueueStats {
        self.shared.lock().stats()
    }
}

impl std::fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQueue")
            .field("config", &self.shared.config)
            .field("stats", &self.stats())
            .finish()
    }
}
