//! Replay queue metrics regression tests

use super::helpers::*;
use offline_resilience_core::OfflineError;
use offline_resilience_replay::{Method, MutationQueue, QueuedRequest, ReplayConfig, RequestOptions};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn replay_outcome_metrics() {
    init_recorder();

    let queue = MutationQueue::with_config(
        |request: QueuedRequest<()>| {
            let outcome = match request.endpoint() {
                "/bad" => Err(OfflineError::client("rejected")),
                "/offline" => Err(OfflineError::connectivity("unreachable")),
                _ => Ok(()),
            };
            std::future::ready(outcome)
        },
        ReplayConfig::builder().name("test_outbox").build(),
    );
    queue.enqueue("/good", RequestOptions::new(Method::Post).priority(3), ());
    queue.enqueue("/bad", RequestOptions::new(Method::Post).priority(2), ());
    queue.enqueue("/offline", RequestOptions::new(Method::Post).priority(1), ());
    queue.process().await;

    assert_counter_exists("replay_requests_total");
    assert_metric_has_label("replay_requests_total", "queue", "test_outbox");
    assert_metric_has_label("replay_requests_total", "outcome", "executed");
    assert_metric_has_label("replay_requests_total", "outcome", "dropped");
    assert_metric_has_label("replay_requests_total", "outcome", "halted");
}
