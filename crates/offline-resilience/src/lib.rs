//! Offline-first resilience for applications that talk to a backend.
//!
//! `offline-resilience` keeps an application useful while the network is
//! flaky or gone. Each component is available as both an individual crate
//! and as a feature in this meta-crate.
//!
//! # Components
//!
//! - **Connectivity** (`connectivity` feature): classifies the link as
//!   strong, weak or offline by actively probing, instead of trusting the
//!   host's online flag
//! - **Replay** (`replay` feature): queues writes made while offline,
//!   keeps only the newest write per endpoint and method, and replays them
//!   in priority and dependency order
//! - **Reporting** (`reporting` feature): persists error reports and
//!   delivers them with exponential backoff and an attempt budget
//! - **Cache** (`cache` feature): single-flight, stale-while-revalidate
//!   cache that can sit in front of a remote cache
//! - **Reconnect** (`reconnect` feature): drains the queues whenever the
//!   monitor sees connectivity return
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! offline-resilience = { version = "0.1", features = ["connectivity", "replay"] }
//! ```
//!
//! Or enable everything:
//!
//! ```toml
//! [dependencies]
//! offline-resilience = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "reconnect", feature = "replay"))]
//! # {
//! use offline_resilience::connectivity::{ConnectivityConfig, ConnectivityMonitor, ProbeError};
//! use offline_resilience::core::OfflineError;
//! use offline_resilience::reconnect::replay_on_reconnect;
//! use offline_resilience::replay::{Method, MutationQueue, QueuedRequest, RequestOptions};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let monitor = ConnectivityMonitor::new(
//!     || async { Ok::<(), ProbeError>(()) },
//!     ConnectivityConfig::default(),
//! );
//! let queue = Arc::new(MutationQueue::new(|request: QueuedRequest<String>| async move {
//!     println!("PUT {}", request.payload());
//!     Ok::<(), OfflineError>(())
//! }));
//!
//! queue.enqueue("/profile", RequestOptions::new(Method::Put), "{\"name\":\"Ada\"}".into());
//!
//! monitor.start();
//! let _replayer = replay_on_reconnect(&monitor, Arc::clone(&queue));
//! # }
//! # }
//! ```

// Re-export core (always available)
pub use offline_resilience_core as core;

// Re-export components based on features
#[cfg(feature = "cache")]
pub use offline_resilience_cache as cache;

#[cfg(feature = "connectivity")]
pub use offline_resilience_connectivity as connectivity;

#[cfg(feature = "replay")]
pub use offline_resilience_replay as replay;

#[cfg(feature = "reporting")]
pub use offline_resilience_reporting as reporting;

#[cfg(feature = "reconnect")]
pub mod reconnect;
