//! Error report queue metrics regression tests

use super::helpers::*;
use offline_resilience_reporting::{
    ErrorReportQueue, MemoryStore, Priority, ReportingConfig, SerializedError,
};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn error_report_metrics() {
    init_recorder();

    let queue = ErrorReportQueue::with_config(
        MemoryStore::new(),
        ReportingConfig::builder()
            .name("test_reports")
            .max_attempts(1)
            .build(),
    );
    queue
        .enqueue(SerializedError::new("ok"), Priority::Critical)
        .unwrap();
    queue
        .enqueue(SerializedError::new("fails"), Priority::Normal)
        .unwrap();

    queue
        .process(&|report: SerializedError| async move {
            if report.message == "fails" {
                Err("collector down".to_string())
            } else {
                Ok(())
            }
        })
        .await;

    assert_counter_exists("error_reports_total");
    assert_metric_has_label("error_reports_total", "queue", "test_reports");
    assert_metric_has_label("error_reports_total", "outcome", "enqueued");
    assert_metric_has_label("error_reports_total", "outcome", "delivered");
    assert_metric_has_label("error_reports_total", "outcome", "dropped");
}
