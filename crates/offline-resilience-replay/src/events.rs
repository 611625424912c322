//! Events emitted by the mutation queue.

use crate::request::{Method, RequestId};
use offline_resilience_core::events::ResilienceEvent;
use offline_resilience_core::FailureKind;
use std::time::Instant;

/// Events emitted by [`MutationQueue`](crate::MutationQueue).
#[derive(Debug, Clone)]
pub enum ReplayEvent {
    /// A new mutation was queued.
    Enqueued {
        pattern_name: String,
        timestamp: Instant,
        request_id: RequestId,
        endpoint: String,
        method: Method,
    },
    /// A queued mutation for the same endpoint and method was replaced.
    Replaced {
        pattern_name: String,
        timestamp: Instant,
        request_id: RequestId,
        endpoint: String,
        method: Method,
    },
    /// A mutation was sent successfully and left the queue.
    Executed {
        pattern_name: String,
        timestamp: Instant,
        request_id: RequestId,
    },
    /// A mutation failed for a non-connectivity reason and was discarded.
    Dropped {
        pattern_name: String,
        timestamp: Instant,
        request_id: RequestId,
        kind: FailureKind,
    },
    /// A connectivity failure stopped the drain.
    Halted {
        pattern_name: String,
        timestamp: Instant,
        request_id: RequestId,
        remaining: usize,
    },
}

impl ResilienceEvent for ReplayEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReplayEvent::Enqueued { .. } => "enqueued",
            ReplayEvent::Replaced { .. } => "replaced",
            ReplayEvent::Executed { .. } => "executed",
            ReplayEvent::Dropped { .. } => "dropped",
            ReplayEvent::Halted { .. } => "halted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ReplayEvent::Enqueued { timestamp, .. }
            | ReplayEvent::Replaced { timestamp, .. }
            | ReplayEvent::Executed { timestamp, .. }
            | ReplayEvent::Dropped { timestamp, .. }
            | ReplayEvent::Halted { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ReplayEvent::Enqueued { pattern_name, .. }
            | ReplayEvent::Replaced { pattern_name, .. }
            | ReplayEvent::Executed { pattern_name, .. }
            | ReplayEvent::Dropped { pattern_name, .. }
            | ReplayEvent::Halted { pattern_name, .. } => pattern_name,
        }
    }
}
