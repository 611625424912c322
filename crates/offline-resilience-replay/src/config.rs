//! Configuration for the mutation queue.

use crate::events::ReplayEvent;
use crate::request::RequestId;
use offline_resilience_core::{EventListeners, FailureKind, FnListener};

/// Configuration for [`MutationQueue`](crate::MutationQueue).
pub struct ReplayConfig {
    pub(crate) event_listeners: EventListeners<ReplayEvent>,
    pub(crate) name: String,
}

impl ReplayConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ReplayConfigBuilder {
        ReplayConfigBuilder::new()
    }

    /// Get the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfigBuilder::new().build()
    }
}

/// Builder for [`ReplayConfig`].
pub struct ReplayConfigBuilder {
    event_listeners: EventListeners<ReplayEvent>,
    name: String,
}

impl ReplayConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the name of this queue for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for newly queued mutations.
    pub fn on_enqueued<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReplayEvent::Enqueued { request_id, .. } = event {
                f(*request_id);
            }
        }));
        self
    }

    /// Registers a callback for mutations replaced in place.
    pub fn on_replaced<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReplayEvent::Replaced { request_id, .. } = event {
                f(*request_id);
            }
        }));
        self
    }

    /// Registers a callback for successfully replayed mutations.
    pub fn on_executed<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestId) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReplayEvent::Executed { request_id, .. } = event {
                f(*request_id);
            }
        }));
        self
    }

    /// Registers a callback for discarded mutations.
    pub fn on_dropped<F>(mut self, f: F) -> Self
    where
        F: Fn(RequestId, FailureKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReplayEvent::Dropped {
                request_id, kind, ..
            } = event
            {
                f(*request_id, *kind);
            }
        }));
        self
    }

    /// Registers a callback for drains stopped by a connectivity failure.
    ///
    /// Receives the number of mutations still queued.
    pub fn on_halted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ReplayEvent::Halted { remaining, .. } = event {
                f(*remaining);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ReplayConfig {
        ReplayConfig {
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for ReplayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
