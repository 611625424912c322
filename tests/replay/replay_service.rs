//! Replaying through a `tower::Service`.

use offline_resilience_core::OfflineError;
use offline_resilience_replay::{
    Method, MutationQueue, QueuedRequest, RequestOptions, ServiceExecutor,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tower::{service_fn, ServiceBuilder};

#[tokio::test]
async fn service_executor_sends_every_mutation() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&received);
    let service = service_fn(move |request: QueuedRequest<Vec<u8>>| {
        let r = Arc::clone(&r);
        async move {
            r.lock()
                .push(format!("{} {}", request.method(), request.endpoint()));
            Ok::<_, OfflineError>(request.payload().len())
        }
    });

    let queue = MutationQueue::new(ServiceExecutor::new(service));
    queue.enqueue("/upload", RequestOptions::new(Method::Post), vec![1, 2, 3]);
    queue.enqueue("/meta", RequestOptions::new(Method::Patch), vec![4]);

    let report = queue.process().await;
    assert_eq!(report.executed, 2);
    assert_eq!(
        *received.lock(),
        vec!["POST /upload".to_string(), "PATCH /meta".to_string()]
    );
}

#[tokio::test]
async fn status_codes_are_classified_by_a_mapping_layer() {
    let backend = service_fn(|request: QueuedRequest<String>| async move {
        match request.endpoint() {
            "/offline" => Err(0u16),
            "/invalid" => Err(422),
            _ => Ok(()),
        }
    });
    let service = ServiceBuilder::new()
        .map_err(|status: u16| match status {
            0 => OfflineError::connectivity("no response"),
            _ => OfflineError::client(format!("status {status}")),
        })
        .service(backend);

    let queue = MutationQueue::new(ServiceExecutor::new(service));
    queue.enqueue("/invalid", RequestOptions::new(Method::Post).priority(2), String::new());
    queue.enqueue("/notes", RequestOptions::new(Method::Put).priority(1), "text".to_string());
    queue.enqueue("/offline", RequestOptions::new(Method::Post), String::new());

    let report = queue.process().await;
    assert_eq!(report.dropped, 1);
    assert_eq!(report.executed, 1);
    assert!(report.halted);
    assert_eq!(report.remaining, 1);
}
