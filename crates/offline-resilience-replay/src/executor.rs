//! Executors that send queued mutations upstream.

use crate::request::QueuedRequest;
use offline_resilience_core::Classify;
use std::future::Future;
use tower::{Service, ServiceExt};

/// Sends one queued mutation to the backend.
///
/// The error's [`Classify::failure_kind`] decides what the queue does next:
/// a connectivity failure halts the drain and keeps the request queued, any
/// other failure drops it.
///
/// # Examples
///
/// Using a closure (via blanket impl):
///
/// ```rust
/// use offline_resilience_core::OfflineError;
/// use offline_resilience_replay::{Executor, QueuedRequest};
///
/// let executor = |request: QueuedRequest<String>| async move {
///     println!("{} {}: {}", request.method(), request.endpoint(), request.payload());
///     Ok::<(), OfflineError>(())
/// };
/// ```
pub trait Executor<P>: Send + Sync {
    /// Error returned by a failed attempt.
    type Error: Classify + Send;

    /// Attempts `request` once.
    fn execute(
        &self,
        request: QueuedRequest<P>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<P, F, Fut, E> Executor<P> for F
where
    F: Fn(QueuedRequest<P>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Classify + Send,
{
    type Error = E;

    fn execute(
        &self,
        request: QueuedRequest<P>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self(request)
    }
}

/// Adapts a [`tower::Service`] into an [`Executor`].
///
/// Each attempt clones the service and drives it with
/// [`ServiceExt::oneshot`], so readiness is respected and middleware such as
/// timeouts or rate limits applies to replayed requests.
///
/// ```rust
/// use offline_resilience_core::OfflineError;
/// use offline_resilience_replay::{MutationQueue, QueuedRequest, ServiceExecutor};
/// use tower::service_fn;
///
/// let service = service_fn(|request: QueuedRequest<Vec<u8>>| async move {
///     Ok::<_, OfflineError>(request.payload().len())
/// });
/// let queue: MutationQueue<Vec<u8>, _> = MutationQueue::new(ServiceExecutor::new(service));
/// # let _ = queue;
/// ```
#[derive(Debug, Clone)]
pub struct ServiceExecutor<S> {
    service: S,
}

impl<S> ServiceExecutor<S> {
    /// Wraps `service`; each mutation is sent through a clone of it.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Returns the wrapped service.
    pub fn into_inner(self) -> S {
        self.service
    }
}

impl<P, S> Executor<P> for ServiceExecutor<S>
where
    P: Send + 'static,
    S: Service<QueuedRequest<P>> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Classify + Send,
{
    type Error = S::Error;

    fn execute(
        &self,
        request: QueuedRequest<P>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let service = self.service.clone();
        async move { service.oneshot(request).await.map(|_| ()) }
    }
}
