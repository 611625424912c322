//! Property tests for the mutation replay queue.
//!
//! Invariants tested:
//! - At most one queued mutation per (endpoint, method)
//! - A drain sends each pair exactly once, with its latest payload
//! - Drain order never violates priority

use offline_resilience_core::OfflineError;
use offline_resilience_replay::{Method, MutationQueue, QueuedRequest, RequestOptions};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn method() -> impl Strategy<Value = Method> {
    prop_oneof![
        Just(Method::Post),
        Just(Method::Put),
        Just(Method::Patch),
        Just(Method::Delete),
    ]
}

fn mutation() -> impl Strategy<Value = (u8, Method, i32, u32)> {
    (0u8..6, method(), -3i32..3, any::<u32>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: dedup keeps one entry per pair and the last payload wins
    #[test]
    fn drain_sends_each_pair_once_with_latest_payload(
        mutations in prop::collection::vec(mutation(), 1..60),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let sent = Arc::new(Mutex::new(Vec::new()));
            let s = Arc::clone(&sent);
            let queue = MutationQueue::new(move |request: QueuedRequest<u32>| {
                s.lock().push((
                    request.endpoint().to_string(),
                    request.method(),
                    request.priority(),
                    *request.payload(),
                ));
                std::future::ready(Ok::<(), OfflineError>(()))
            });

            let mut latest = HashMap::new();
            for (endpoint, method, priority, payload) in &mutations {
                let endpoint = format!("/items/{endpoint}");
                queue.enqueue(
                    endpoint.clone(),
                    RequestOptions::new(*method).priority(*priority),
                    *payload,
                );
                latest.insert((endpoint, *method), (*priority, *payload));
            }
            prop_assert_eq!(queue.len(), latest.len());

            let report = queue.process().await;
            prop_assert_eq!(report.executed, latest.len());
            prop_assert!(queue.is_empty());

            let sent = sent.lock().clone();
            prop_assert_eq!(sent.len(), latest.len());
            for (endpoint, method, priority, payload) in &sent {
                let expected = latest.get(&(endpoint.clone(), *method));
                prop_assert_eq!(expected, Some(&(*priority, *payload)));
            }
            for pair in sent.windows(2) {
                prop_assert!(pair[0].2 >= pair[1].2, "priority order violated");
            }

            Ok(())
        })?;
    }
}
