//! Delivery order and retry scheduling.

use offline_resilience_core::{FixedInterval, ManualClock};
use offline_resilience_reporting::{
    ErrorReportQueue, MemoryStore, Priority, ReportingConfig, SerializedError,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const START: u64 = 1_700_000_000_000;

fn recorder(
    sent: &Arc<Mutex<Vec<String>>>,
    fail: bool,
) -> impl Fn(SerializedError) -> std::future::Ready<Result<(), String>> + Send + Sync {
    let sent = Arc::clone(sent);
    move |report: SerializedError| {
        sent.lock().push(report.message.clone());
        std::future::ready(if fail {
            Err("collector unavailable".to_string())
        } else {
            Ok(())
        })
    }
}

fn queue_with_clock(clock: &ManualClock, max_attempts: u32) -> ErrorReportQueue<MemoryStore> {
    ErrorReportQueue::with_config(
        MemoryStore::new(),
        ReportingConfig::builder()
            .clock(clock.clone())
            .base_delay(Duration::from_secs(1))
            .max_attempts(max_attempts)
            .build(),
    )
}

#[tokio::test]
async fn critical_reports_are_delivered_first() {
    let queue = ErrorReportQueue::new(MemoryStore::new());
    queue
        .enqueue(SerializedError::new("normal"), Priority::Normal)
        .unwrap();
    queue
        .enqueue(SerializedError::new("critical"), Priority::Critical)
        .unwrap();

    let sent = Arc::new(Mutex::new(Vec::new()));
    let report = queue.process(&recorder(&sent, false)).await;

    assert_eq!(report.delivered, 2);
    assert_eq!(*sent.lock(), vec!["critical", "normal"]);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn failed_delivery_backs_off_exponentially() {
    let clock = ManualClock::new(START);
    let queue = queue_with_clock(&clock, 5);
    queue
        .enqueue(SerializedError::new("boom"), Priority::Normal)
        .unwrap();
    let sent = Arc::new(Mutex::new(Vec::new()));
    let failing = recorder(&sent, true);

    let report = queue.process(&failing).await;
    assert_eq!(report.rescheduled, 1);
    let entry = &queue.entries()[0];
    assert_eq!(entry.attempts, 1);
    assert_eq!(entry.next_retry_at, START + 2_000);

    // Not yet due: left untouched.
    clock.advance(Duration::from_millis(1_999));
    let report = queue.process(&failing).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(queue.entries()[0].attempts, 1);
    assert_eq!(sent.lock().len(), 1);

    clock.advance(Duration::from_millis(1));
    queue.process(&failing).await;
    let entry = &queue.entries()[0];
    assert_eq!(entry.attempts, 2);
    assert_eq!(entry.next_retry_at, START + 2_000 + 4_000);
}

#[tokio::test]
async fn report_is_dropped_after_its_last_attempt() {
    let clock = ManualClock::new(START);
    let dropped = Arc::new(Mutex::new(Vec::new()));
    let d = Arc::clone(&dropped);
    let queue = ErrorReportQueue::with_config(
        MemoryStore::new(),
        ReportingConfig::builder()
            .clock(clock.clone())
            .max_attempts(2)
            .on_dropped(move |id| d.lock().push(id))
            .build(),
    );
    let id = queue
        .enqueue(SerializedError::new("flaky"), Priority::Critical)
        .unwrap();

    let sent = Arc::new(Mutex::new(Vec::new()));
    let failing = recorder(&sent, true);

    queue.process(&failing).await;
    clock.advance(Duration::from_secs(60));
    let report = queue.process(&failing).await;

    assert_eq!(report.dropped, 1);
    assert!(queue.is_empty());
    assert_eq!(sent.lock().len(), 2);
    assert_eq!(*dropped.lock(), vec![id]);
}

#[tokio::test]
async fn per_report_attempt_budget() {
    let clock = ManualClock::new(START);
    let queue = queue_with_clock(&clock, 5);
    queue
        .enqueue_with_max_attempts(SerializedError::new("one-shot"), Priority::Normal, 1)
        .unwrap();

    let sent = Arc::new(Mutex::new(Vec::new()));
    let report = queue.process(&recorder(&sent, true)).await;

    assert_eq!(report.dropped, 1);
    assert_eq!(report.rescheduled, 0);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn reports_enqueued_during_processing_are_kept() {
    let queue = Arc::new(ErrorReportQueue::new(MemoryStore::new()));
    queue
        .enqueue(SerializedError::new("first"), Priority::Normal)
        .unwrap();

    let q = Arc::clone(&queue);
    let processor = move |report: SerializedError| {
        let q = Arc::clone(&q);
        async move {
            if report.message == "first" {
                q.enqueue(SerializedError::new("second"), Priority::Normal)
                    .map_err(|e| e.to_string())?;
            }
            Ok::<(), String>(())
        }
    };

    let report = queue.process(&processor).await;
    assert_eq!(report.delivered, 1);

    let left: Vec<_> = queue
        .entries()
        .into_iter()
        .map(|e| e.error.message)
        .collect();
    assert_eq!(left, vec!["second"]);
}

#[tokio::test]
async fn fixed_backoff_can_replace_exponential() {
    let clock = ManualClock::new(START);
    let queue = ErrorReportQueue::with_config(
        MemoryStore::new(),
        ReportingConfig::builder()
            .clock(clock.clone())
            .backoff(FixedInterval::new(Duration::from_millis(500)))
            .build(),
    );
    queue
        .enqueue(SerializedError::new("x"), Priority::Normal)
        .unwrap();

    let sent = Arc::new(Mutex::new(Vec::new()));
    let failing = recorder(&sent, true);
    queue.process(&failing).await;
    clock.advance(Duration::from_millis(500));
    queue.process(&failing).await;

    assert_eq!(queue.entries()[0].next_retry_at, START + 1_000);
}
