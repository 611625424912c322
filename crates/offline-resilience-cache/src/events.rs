//! Events emitted by the cache.

use offline_resilience_core::events::ResilienceEvent;
use std::time::Instant;

/// Why an entry left the cache early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// The cache grew past `max_size`; the oldest-inserted entry went.
    Capacity,
    /// Refreshing the key failed `error_threshold` times in a row.
    RepeatedFetchErrors,
}

/// Events emitted by [`Cache`](crate::Cache).
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A fresh entry was served.
    Hit {
        pattern_name: String,
        timestamp: Instant,
    },
    /// An expired entry inside its grace window was served.
    StaleHit {
        pattern_name: String,
        timestamp: Instant,
    },
    /// No servable entry existed.
    Miss {
        pattern_name: String,
        timestamp: Instant,
    },
    /// An entry was evicted.
    Eviction {
        pattern_name: String,
        timestamp: Instant,
        reason: EvictionReason,
    },
    /// A fetch or background refresh failed.
    FetchFailed {
        pattern_name: String,
        timestamp: Instant,
        consecutive_errors: u32,
    },
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::StaleHit { .. } => "stale_hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Eviction { .. } => "eviction",
            CacheEvent::FetchFailed { .. } => "fetch_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::StaleHit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Eviction { timestamp, .. }
            | CacheEvent::FetchFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. }
            | CacheEvent::StaleHit { pattern_name, .. }
            | CacheEvent::Miss { pattern_name, .. }
            | CacheEvent::Eviction { pattern_name, .. }
            | CacheEvent::FetchFailed { pattern_name, .. } => pattern_name,
        }
    }
}
