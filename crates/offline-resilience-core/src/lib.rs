//! Core infrastructure for offline-resilience.
//!
//! This crate provides shared functionality used across all offline-resilience modules:
//! - Event system for observability, with removable listeners
//! - The failure taxonomy used to route executor and processor errors
//! - Wall-clock abstraction for persisted schedules
//! - Backoff interval functions

pub mod backoff;
pub mod clock;
pub mod error;
pub mod events;

pub use backoff::{ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Classify, FailureKind, OfflineError};
pub use events::{EventListener, EventListeners, FnListener, ListenerId, ResilienceEvent};
