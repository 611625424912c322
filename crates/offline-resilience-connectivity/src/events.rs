//! Events emitted by the connectivity monitor.

use crate::ConnectivityState;
use offline_resilience_core::events::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by [`ConnectivityMonitor`](crate::ConnectivityMonitor).
#[derive(Debug, Clone)]
pub enum ConnectivityEvent {
    /// The classified state changed.
    StateChanged {
        pattern_name: String,
        timestamp: Instant,
        from: ConnectivityState,
        to: ConnectivityState,
        latency: Option<Duration>,
    },
    /// A probe answered.
    ProbeSucceeded {
        pattern_name: String,
        timestamp: Instant,
        latency: Duration,
    },
    /// A probe failed or timed out.
    ProbeFailed {
        pattern_name: String,
        timestamp: Instant,
        reason: String,
    },
}

impl ResilienceEvent for ConnectivityEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ConnectivityEvent::StateChanged { .. } => "state_changed",
            ConnectivityEvent::ProbeSucceeded { .. } => "probe_succeeded",
            ConnectivityEvent::ProbeFailed { .. } => "probe_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ConnectivityEvent::StateChanged { timestamp, .. }
            | ConnectivityEvent::ProbeSucceeded { timestamp, .. }
            | ConnectivityEvent::ProbeFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ConnectivityEvent::StateChanged { pattern_name, .. }
            | ConnectivityEvent::ProbeSucceeded { pattern_name, .. }
            | ConnectivityEvent::ProbeFailed { pattern_name, .. } => pattern_name,
        }
    }
}
