//! Events emitted by the error report queue.

use crate::entry::{ErrorId, Priority};
use offline_resilience_core::events::ResilienceEvent;
use std::time::Instant;

/// Events emitted by [`ErrorReportQueue`](crate::ErrorReportQueue).
#[derive(Debug, Clone)]
pub enum ReportEvent {
    /// A report was persisted.
    Enqueued {
        pattern_name: String,
        timestamp: Instant,
        error_id: ErrorId,
        priority: Priority,
    },
    /// A report was delivered and removed.
    Delivered {
        pattern_name: String,
        timestamp: Instant,
        error_id: ErrorId,
    },
    /// Delivery failed; the report will be retried later.
    Rescheduled {
        pattern_name: String,
        timestamp: Instant,
        error_id: ErrorId,
        attempts: u32,
        next_retry_at: u64,
    },
    /// The report ran out of attempts and was removed.
    Dropped {
        pattern_name: String,
        timestamp: Instant,
        error_id: ErrorId,
        attempts: u32,
    },
    /// The persisted queue could not be parsed and was discarded.
    StateDiscarded {
        pattern_name: String,
        timestamp: Instant,
        reason: String,
    },
}

impl ResilienceEvent for ReportEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReportEvent::Enqueued { .. } => "enqueued",
            ReportEvent::Delivered { .. } => "delivered",
            ReportEvent::Rescheduled { .. } => "rescheduled",
            ReportEvent::Dropped { .. } => "dropped",
            ReportEvent::StateDiscarded { .. } => "state_discarded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ReportEvent::Enqueued { timestamp, .. }
            | ReportEvent::Delivered { timestamp, .. }
            | ReportEvent::Rescheduled { timestamp, .. }
            | ReportEvent::Dropped { timestamp, .. }
            | ReportEvent::StateDiscarded { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            ReportEvent::Enqueued { pattern_name, .. }
            | ReportEvent::Delivered { pattern_name, .. }
            | ReportEvent::Rescheduled { pattern_name, .. }
            | ReportEvent::Dropped { pattern_name, .. }
            | ReportEvent::StateDiscarded { pattern_name, .. } => pattern_name,
        }
    }
}
