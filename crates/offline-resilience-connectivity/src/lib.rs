//! Probe-verified connectivity monitoring.
//!
//! The host platform's online/offline flag is necessary but not sufficient:
//! behind a captive portal it happily reports "online" while nothing gets
//! through. [`ConnectivityMonitor`] therefore treats the flag only as a hint
//! and decides the real state with an active reachability [`Probe`]:
//!
//! - probe succeeds in under 300 ms: [`ConnectivityState::Strong`]
//! - probe succeeds but slower: [`ConnectivityState::Weak`]
//! - probe fails, times out, or the host flag is false: [`ConnectivityState::Offline`]
//!
//! A heartbeat task owned by the monitor re-probes periodically, and the host
//! flag flipping back to online triggers an immediate probe.
//!
//! # Examples
//!
//! ```rust
//! use offline_resilience_connectivity::{
//!     ConnectivityConfig, ConnectivityMonitor, ConnectivityState, ProbeError,
//! };
//! use std::time::Duration;
//!
//! # async fn example() {
//! let monitor = ConnectivityMonitor::new(
//!     || async { Ok::<(), ProbeError>(()) },
//!     ConnectivityConfig::builder()
//!         .name("api")
//!         .heartbeat_interval(Duration::from_secs(30))
//!         .build(),
//! );
//!
//! let subscription = monitor.on_change(|state| {
//!     println!("connectivity is now {}", state);
//! });
//!
//! monitor.start();
//! if monitor.check_now().await == ConnectivityState::Offline {
//!     println!("saving work locally");
//! }
//!
//! subscription.unsubscribe();
//! monitor.stop();
//! # }
//! ```

mod config;
mod error;
mod events;
#[cfg(feature = "http")]
mod http;
mod monitor;
mod probe;

pub use config::{ConnectivityConfig, ConnectivityConfigBuilder, MIN_HEARTBEAT_INTERVAL};
pub use error::ProbeError;
pub use events::ConnectivityEvent;
#[cfg(feature = "http")]
pub use http::{HttpProbe, DEFAULT_HEALTH_PATH};
pub use monitor::{ConnectivityMonitor, ConnectivitySnapshot, Subscription};
pub use probe::Probe;

use std::fmt;

/// Reachability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    /// Reachable with a fast round-trip.
    Strong,

    /// Reachable, but the round-trip exceeded the weak threshold.
    Weak,

    /// Not reachable.
    Offline,
}

impl ConnectivityState {
    /// Returns `true` for `Strong` and `Weak`.
    pub fn is_online(&self) -> bool {
        !matches!(self, ConnectivityState::Offline)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Strong => write!(f, "strong"),
            ConnectivityState::Weak => write!(f, "weak"),
            ConnectivityState::Offline => write!(f, "offline"),
        }
    }
}
