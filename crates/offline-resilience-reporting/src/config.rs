//! Configuration for the error report queue.

use crate::entry::ErrorId;
use crate::events::ReportEvent;
use offline_resilience_core::{
    Clock, EventListeners, ExponentialBackoff, FnListener, IntervalFunction, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "offline-resilience.error-queue";

/// Configuration for [`ErrorReportQueue`](crate::ErrorReportQueue).
pub struct ReportingConfig {
    pub(crate) storage_key: String,
    pub(crate) max_attempts: u32,
    pub(crate) backoff: Arc<dyn IntervalFunction>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) event_listeners: EventListeners<ReportEvent>,
    pub(crate) name: String,
}

impl ReportingConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ReportingConfigBuilder {
        ReportingConfigBuilder::new()
    }

    /// Get the storage key.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Attempt budget for reports enqueued without an explicit one.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Get the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        ReportingConfigBuilder::new().build()
    }
}

/// Builder for [`ReportingConfig`].
pub struct ReportingConfigBuilder {
    storage_key: String,
    max_attempts: u32,
    backoff: Arc<dyn IntervalFunction>,
    clock: Arc<dyn Clock>,
    event_listeners: EventListeners<ReportEvent>,
    name: String,
}

impl ReportingConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_attempts: 5,
            backoff: Arc::new(ExponentialBackoff::new(Duration::from_secs(1))),
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the key the queue is persisted under.
    ///
    /// Default: `"offline-resilience.error-queue"`
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Sets the default attempt budget per report.
    ///
    /// Default: 5
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Uses exponential backoff starting from `base`: the retry after the
    /// n-th failed attempt waits `base * 2^n`.
    ///
    /// Default: 1 second
    pub fn base_delay(mut self, base: Duration) -> Self {
        self.backoff = Arc::new(ExponentialBackoff::new(base));
        self
    }

    /// Replaces the backoff schedule.
    ///
    /// `next_interval` receives the number of failed attempts so far.
    pub fn backoff<I>(mut self, backoff: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Sets the wall clock used for retry schedules.
    ///
    /// Default: [`SystemClock`]
    pub fn clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the name of this queue for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for delivered reports.
    pub fn on_delivered<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorId) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReportEvent::Delivered { error_id, .. } = event {
                f(*error_id);
            }
        }));
        self
    }

    /// Registers a callback for failed deliveries that will be retried.
    ///
    /// Receives the id and the attempts made so far.
    pub fn on_rescheduled<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorId, u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReportEvent::Rescheduled {
                error_id, attempts, ..
            } = event
            {
                f(*error_id, *attempts);
            }
        }));
        self
    }

    /// Registers a callback for reports that ran out of attempts.
    pub fn on_dropped<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorId) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReportEvent::Dropped { error_id, .. } = event {
                f(*error_id);
            }
        }));
        self
    }

    /// Registers a callback for a persisted queue discarded as unreadable.
    pub fn on_state_discarded<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReportEvent::StateDiscarded { reason, .. } = event {
                f(reason);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ReportingConfig {
        ReportingConfig {
            storage_key: self.storage_key,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            clock: self.clock,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for ReportingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
