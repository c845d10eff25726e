// Deferred-result handle

use crate::domain::{QueueError, RequestId};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(super) type Completion<T, E> = oneshot::Sender<Result<T, QueueError<E>>>;

/// Future returned by `RequestQueue::enqueue`.
///
/// Resolves exactly once with the operation's value or a `QueueError`.
/// Dropping the handle does not cancel the request.
pub struct RequestHandle<T, E> {
    id: RequestId,
    rx: oneshot::Receiver<Result<T, QueueError<E>>>,
}

impl<T, E> RequestHandle<T, E> {
    pub(super) fn channel(id: RequestId) -> (Completion<T, E>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { id, rx })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T, E> Future for RequestHandle<T, E> {
    type Output = Result<T, QueueError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Sender dropped without settling (runtime shut down mid-request)
            Poll::Ready(Err(_)) => Poll::Ready(Err(QueueError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> std::fmt::Debug for RequestHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandle").field("id", &self.id).finish()
    }
}
