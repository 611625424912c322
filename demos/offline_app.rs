//! A small offline-first client wiring every component together.
//!
//! Run with: cargo run --example offline_app -- http://localhost:8080

use offline_resilience::cache::{Cache, CacheConfig};
use offline_resilience::connectivity::{ConnectivityConfig, ConnectivityMonitor, HttpProbe};
use offline_resilience::core::OfflineError;
use offline_resilience::reconnect::{replay_on_reconnect, report_on_reconnect};
use offline_resilience::replay::{Method, MutationQueue, QueuedRequest, ReplayConfig, RequestOptions};
use offline_resilience::reporting::{
    ErrorReportQueue, FileStore, Priority, ReportingConfig, SerializedError,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let monitor = ConnectivityMonitor::new(
        HttpProbe::new(&base_url)?,
        ConnectivityConfig::builder()
            .name("backend")
            .heartbeat_interval(Duration::from_secs(5))
            .on_state_change(|from, to| println!("connectivity: {} -> {}", from, to))
            .build(),
    );

    let outbox = Arc::new(MutationQueue::with_config(
        |request: QueuedRequest<String>| async move {
            // A real client would send the request here.
            println!("replaying {} {}", request.method(), request.endpoint());
            Ok::<(), OfflineError>(())
        },
        ReplayConfig::builder()
            .name("outbox")
            .on_dropped(|id, kind| println!("dropped mutation {} ({:?})", id, kind))
            .build(),
    ));

    let store_dir = std::env::temp_dir().join("offline-resilience-demo");
    let reports = Arc::new(ErrorReportQueue::with_config(
        FileStore::new(&store_dir)?,
        ReportingConfig::builder()
            .name("crash-reports")
            .base_delay(Duration::from_secs(2))
            .build(),
    ));
    let collector = Arc::new(|report: SerializedError| async move {
        println!("reporting: {}", report);
        Ok::<(), String>(())
    });

    let profiles: Cache<String, String> = Cache::new(
        CacheConfig::builder()
            .name("profiles")
            .ttl(Duration::from_secs(30))
            .build(),
    );

    outbox.enqueue(
        "/api/profile",
        RequestOptions::new(Method::Put),
        r#"{"name":"Ada"}"#.to_string(),
    );
    reports.enqueue(
        SerializedError::new("demo failure").with_code("E_DEMO"),
        Priority::Normal,
    )?;

    monitor.start();
    let _replayer = replay_on_reconnect(&monitor, Arc::clone(&outbox));
    let _reporter = report_on_reconnect(&monitor, Arc::clone(&reports), collector);

    for _ in 0..3 {
        let profile = profiles
            .get_or_create("ada".to_string(), || async {
                Ok::<_, OfflineError>("Ada Lovelace".to_string())
            })
            .await?;
        println!(
            "state={} profile={} pending_mutations={} pending_reports={}",
            monitor.state(),
            profile,
            outbox.len(),
            reports.len()
        );
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    println!("cache: {:?}", profiles.metrics());
    monitor.stop();
    Ok(())
}
