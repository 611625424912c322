//! Reports surviving restarts, and recovery from unreadable state.

use offline_resilience_reporting::{
    DurableStore, ErrorReportQueue, FileStore, MemoryStore, Priority, ReportingConfig,
    SerializedError, DEFAULT_STORAGE_KEY,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::test]
async fn reports_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let queue = ErrorReportQueue::new(FileStore::new(dir.path()).unwrap());
        queue
            .enqueue(
                SerializedError::new("disk full").with_code("E_DISK"),
                Priority::Critical,
            )
            .unwrap();
        queue
            .enqueue(SerializedError::new("timeout"), Priority::Normal)
            .unwrap();
    }

    let reopened = ErrorReportQueue::new(FileStore::new(dir.path()).unwrap());
    let entries = reopened.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].error.code.as_deref(), Some("E_DISK"));

    let report = reopened
        .process(&|_report: SerializedError| async { Ok::<(), String>(()) })
        .await;
    assert_eq!(report.delivered, 2);

    // An empty queue leaves no file behind.
    let file = dir.path().join(format!("{DEFAULT_STORAGE_KEY}.json"));
    assert!(!file.exists());
}

#[tokio::test]
async fn persisted_format_is_camel_case_json() {
    let store = Arc::new(MemoryStore::new());
    let queue = ErrorReportQueue::new(Arc::clone(&store));
    queue
        .enqueue(SerializedError::new("oops"), Priority::Critical)
        .unwrap();

    let raw = store.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &json[0];
    assert_eq!(entry["priority"], "critical");
    assert_eq!(entry["attempts"], 0);
    assert_eq!(entry["maxAttempts"], 5);
    assert!(entry["nextRetryAt"].is_u64());
    assert_eq!(entry["error"]["message"], "oops");
}

#[tokio::test]
async fn corrupt_state_is_discarded_and_queue_keeps_working() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(format!("{DEFAULT_STORAGE_KEY}.json")),
        "{not json",
    )
    .unwrap();

    let discarded = Arc::new(Mutex::new(0));
    let d = Arc::clone(&discarded);
    let queue = ErrorReportQueue::with_config(
        FileStore::new(dir.path()).unwrap(),
        ReportingConfig::builder()
            .on_state_discarded(move |_reason| *d.lock() += 1)
            .build(),
    );

    assert!(queue.entries().is_empty());
    assert!(*discarded.lock() >= 1);

    queue
        .enqueue(SerializedError::new("after recovery"), Priority::Normal)
        .unwrap();
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn separate_storage_keys_do_not_interfere() {
    let store = Arc::new(MemoryStore::new());
    let web = ErrorReportQueue::with_config(
        Arc::clone(&store),
        ReportingConfig::builder().storage_key("web.errors").build(),
    );
    let worker = ErrorReportQueue::with_config(
        Arc::clone(&store),
        ReportingConfig::builder().storage_key("worker.errors").build(),
    );

    web.enqueue(SerializedError::new("a"), Priority::Normal)
        .unwrap();
    assert_eq!(web.len(), 1);
    assert!(worker.is_empty());

    worker.clear().unwrap();
    assert_eq!(web.len(), 1);
}

#[tokio::test]
async fn clear_removes_everything() {
    let queue = ErrorReportQueue::new(MemoryStore::new());
    for message in ["a", "b", "c"] {
        queue
            .enqueue(SerializedError::new(message), Priority::Normal)
            .unwrap();
    }
    queue.clear().unwrap();
    assert!(queue.is_empty());
}
