//! What a drain does when the backend fails.

use super::{endpoints, recording_executor};
use offline_resilience_core::{FailureKind, OfflineError};
use offline_resilience_replay::{
    Method, MutationQueue, QueuedRequest, ReplayConfig, RequestOptions,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn connectivity_failure_halts_and_keeps_everything() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let offline = Arc::new(AtomicBool::new(true));
    let o = Arc::clone(&offline);
    let queue = MutationQueue::new(recording_executor(&log, move |_| {
        if o.load(Ordering::SeqCst) {
            Err(OfflineError::connectivity("network unreachable"))
        } else {
            Ok(())
        }
    }));

    queue.enqueue("/a", RequestOptions::new(Method::Post), String::new());
    queue.enqueue("/b", RequestOptions::new(Method::Post), String::new());

    let report = queue.process().await;
    assert!(report.halted);
    assert_eq!(report.executed, 0);
    assert_eq!(report.remaining, 2);
    assert_eq!(endpoints(&log), vec!["/a"]);

    offline.store(false, Ordering::SeqCst);
    let report = queue.process().await;
    assert!(!report.halted);
    assert_eq!(report.executed, 2);
    assert_eq!(report.remaining, 0);
    assert_eq!(endpoints(&log), vec!["/a", "/a", "/b"]);
}

#[tokio::test]
async fn rejected_mutation_is_dropped_and_drain_continues() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dropped = Arc::new(Mutex::new(Vec::new()));
    let d = Arc::clone(&dropped);

    let queue = MutationQueue::with_config(
        recording_executor(&log, |sent| {
            if sent.endpoint == "/invalid" {
                Err(OfflineError::client("422 unprocessable"))
            } else {
                Ok(())
            }
        }),
        ReplayConfig::builder()
            .name("outbox")
            .on_dropped(move |id, kind| d.lock().push((id, kind)))
            .build(),
    );

    let invalid = queue.enqueue("/invalid", RequestOptions::new(Method::Post), String::new());
    queue.enqueue("/valid", RequestOptions::new(Method::Post), String::new());

    let report = queue.process().await;
    assert_eq!(report.executed, 1);
    assert_eq!(report.dropped, 1);
    assert!(queue.is_empty());
    assert!(!queue.contains(invalid));
    assert_eq!(*dropped.lock(), vec![(invalid, FailureKind::Client)]);
}

#[tokio::test]
async fn dependent_of_a_dropped_mutation_still_runs() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let queue = MutationQueue::new(recording_executor(&log, |sent| {
        if sent.endpoint == "/parent" {
            Err(OfflineError::transient("500"))
        } else {
            Ok(())
        }
    }));

    let parent = queue.enqueue("/parent", RequestOptions::new(Method::Post), String::new());
    queue.enqueue(
        "/child",
        RequestOptions::new(Method::Post).depends_on(parent),
        String::new(),
    );

    let report = queue.process().await;
    assert_eq!(report.dropped, 1);
    assert_eq!(report.executed, 1);
    assert_eq!(endpoints(&log), vec!["/parent", "/child"]);
}

#[tokio::test(start_paused = true)]
async fn only_one_drain_runs_at_a_time() {
    let executor = |_request: QueuedRequest<String>| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<(), OfflineError>(())
    };
    let queue = MutationQueue::new(executor);
    queue.enqueue("/a", RequestOptions::new(Method::Post), String::new());

    let (first, second) = tokio::join!(queue.process(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(queue.is_draining());
        queue.process().await
    });

    assert_eq!(first.executed, 1);
    assert!(!first.skipped);
    assert!(second.skipped);
    assert_eq!(second.executed, 0);
    assert!(!queue.is_draining());
}

#[tokio::test(start_paused = true)]
async fn replacement_during_attempt_keeps_newer_payload() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = Arc::clone(&log);
    let executor = move |request: QueuedRequest<String>| {
        let log = Arc::clone(&l);
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            log.lock().push(request.into_payload());
            Ok::<(), OfflineError>(())
        }
    };
    let queue = MutationQueue::new(executor);
    queue.enqueue("/doc", RequestOptions::new(Method::Put), "draft".to_string());

    let (report, _) = tokio::join!(queue.process(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.enqueue("/doc", RequestOptions::new(Method::Put), "final".to_string());
    });

    // The newer payload arrived mid-flight, so it is sent as well.
    assert_eq!(report.remaining, 0);
    assert_eq!(*log.lock(), vec!["draft".to_string(), "final".to_string()]);
}

#[tokio::test]
async fn dependent_waits_across_drains_until_its_dependency_leaves() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let offline = Arc::new(AtomicBool::new(true));
    let o = Arc::clone(&offline);
    let queue = MutationQueue::new(recording_executor(&log, move |sent| {
        if sent.endpoint == "/orders" && o.load(Ordering::SeqCst) {
            Err(OfflineError::connectivity("connection reset"))
        } else {
            Ok(())
        }
    }));

    let order = queue.enqueue("/orders", RequestOptions::new(Method::Post), "order".to_string());
    let line = queue.enqueue(
        "/orders/lines",
        RequestOptions::new(Method::Post).priority(100).depends_on(order),
        "line".to_string(),
    );
    queue.enqueue("/audit", RequestOptions::new(Method::Post).priority(50), String::new());

    // First drain: the dependent outranks everything but is never attempted.
    let report = queue.process().await;
    assert!(report.halted);
    assert_eq!(report.executed, 1);
    assert_eq!(endpoints(&log), vec!["/audit", "/orders"]);
    assert!(queue.contains(order));
    assert!(queue.contains(line));

    // Second drain: the dependency goes through and the dependent follows
    // within the same drain.
    offline.store(false, Ordering::SeqCst);
    let report = queue.process().await;
    assert!(!report.halted);
    assert_eq!(report.executed, 2);
    assert_eq!(report.remaining, 0);
    assert_eq!(
        endpoints(&log),
        vec!["/audit", "/orders", "/orders", "/orders/lines"]
    );
}
