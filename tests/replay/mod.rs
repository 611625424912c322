//! Replay queue tests.
//!
//! Test organization:
//! - replay_ordering.rs: dedup, priority and dependency order
//! - replay_failures.rs: halting, dropping and concurrent drains
//! - replay_service.rs: driving the queue with a tower service

mod replay_failures;
mod replay_service;

use offline_resilience_core::OfflineError;
use offline_resilience_replay::QueuedRequest;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;

/// One attempted request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sent {
    pub endpoint: String,
    pub method: &'static str,
    pub payload: String,
}

/// Executor that records every attempt and answers through `respond`.
pub(crate) fn recording_executor<F>(
    log: &Arc<Mutex<Vec<Sent>>>,
    respond: F,
) -> impl Fn(QueuedRequest<String>) -> std::pin::Pin<Box<dyn Future<Output = Result<(), OfflineError>> + Send>>
       + Send
       + Sync
       + 'static
where
    F: Fn(&Sent) -> Result<(), OfflineError> + Send + Sync + 'static,
{
    let log = Arc::clone(log);
    move |request: QueuedRequest<String>| {
        let sent = Sent {
            endpoint: request.endpoint().to_string(),
            method: request.method().as_str(),
            payload: request.into_payload(),
        };
        let outcome = respond(&sent);
        log.lock().push(sent);
        Box::pin(async move { outcome })
    }
}

pub(crate) fn endpoints(log: &Arc<Mutex<Vec<Sent>>>) -> Vec<String> {
    log.lock().iter().map(|s| s.endpoint.clone()).collect()
}
