//! Durable, prioritized error reporting.
//!
//! Errors raised while the backend is unreachable should not be lost.
//! [`ErrorReportQueue`] persists each report through a [`DurableStore`] the
//! moment it is enqueued and delivers due reports through an
//! [`ErrorProcessor`] whenever [`ErrorReportQueue::process`] runs.
//!
//! # Delivery rules
//!
//! - [`Priority::Critical`] reports go before [`Priority::Normal`] ones;
//!   within a priority, reports go in enqueue order.
//! - A failed delivery increments the report's attempt count and schedules
//!   the next attempt `base * 2^attempts` later (1 s base by default).
//! - A report that reaches its attempt budget (5 by default) is removed and
//!   never sent again.
//! - Unreadable persisted state is discarded and the queue starts empty.
//!
//! # Examples
//!
//! ```rust,no_run
//! use offline_resilience_reporting::{
//!     ErrorReportQueue, FileStore, Priority, ReportingConfig, SerializedError,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = ErrorReportQueue::with_config(
//!     FileStore::new("/var/lib/myapp/reports")?,
//!     ReportingConfig::builder()
//!         .name("crash-reports")
//!         .base_delay(Duration::from_millis(500))
//!         .max_attempts(8)
//!         .build(),
//! );
//!
//! let err = std::io::Error::new(std::io::ErrorKind::Other, "sync failed");
//! queue.enqueue(SerializedError::from_error(&err), Priority::Normal)?;
//!
//! queue
//!     .process(&|report: SerializedError| async move {
//!         // POST the report to the collector here.
//!         let _ = report;
//!         Ok::<(), std::io::Error>(())
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

mod config;
mod entry;
mod error;
mod events;
mod processor;
mod queue;
mod store;

pub use config::{ReportingConfig, ReportingConfigBuilder, DEFAULT_STORAGE_KEY};
pub use entry::{ErrorId, Priority, QueuedError, SerializedError};
pub use error::{ReportingError, StoreError};
pub use events::ReportEvent;
pub use processor::ErrorProcessor;
pub use queue::{ErrorReportQueue, ProcessReport};
pub use store::{DurableStore, FileStore, MemoryStore};
