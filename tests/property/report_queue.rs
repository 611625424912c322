//! Property tests for the error report queue.
//!
//! Invariants tested:
//! - Every report is delivered exactly once
//! - Critical reports precede normal ones, each class in enqueue order

use offline_resilience_reporting::{ErrorReportQueue, MemoryStore, Priority, SerializedError};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use tokio::runtime::Runtime;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: delivery order is priority first, then enqueue order
    #[test]
    fn delivery_order_is_priority_then_fifo(
        critical in prop::collection::vec(any::<bool>(), 1..30),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let queue = ErrorReportQueue::new(MemoryStore::new());
            for (i, is_critical) in critical.iter().enumerate() {
                let priority = if *is_critical { Priority::Critical } else { Priority::Normal };
                queue.enqueue(SerializedError::new(i.to_string()), priority).unwrap();
            }

            let delivered = Arc::new(Mutex::new(Vec::new()));
            let d = Arc::clone(&delivered);
            let processor = move |report: SerializedError| {
                d.lock().push(report.message);
                std::future::ready(Ok::<(), String>(()))
            };
            let report = queue.process(&processor).await;
            prop_assert_eq!(report.delivered, critical.len());
            prop_assert!(queue.is_empty());

            let expected: Vec<String> = critical
                .iter()
                .enumerate()
                .filter(|(_, c)| **c)
                .chain(critical.iter().enumerate().filter(|(_, c)| !**c))
                .map(|(i, _)| i.to_string())
                .collect();
            prop_assert_eq!(&*delivered.lock(), &expected);

            Ok(())
        })?;
    }
}
