//! Configuration for the connectivity monitor.

use crate::{ConnectivityEvent, ConnectivityState};
use offline_resilience_core::{EventListeners, FnListener};
use std::time::Duration;

/// Shortest heartbeat interval the builder accepts.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for [`ConnectivityMonitor`](crate::ConnectivityMonitor).
#[derive(Clone)]
pub struct ConnectivityConfig {
    /// Interval between heartbeat probes
    pub(crate) heartbeat_interval: Duration,

    /// Round-trips at or above this are classified as weak
    pub(crate) weak_threshold: Duration,

    /// Upper bound for a single probe
    pub(crate) probe_timeout: Duration,

    /// Host online flag assumed at construction
    pub(crate) initial_host_online: bool,

    pub(crate) event_listeners: EventListeners<ConnectivityEvent>,
    pub(crate) name: String,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfigBuilder::new().build()
    }
}

impl ConnectivityConfig {
    /// Create a new builder.
    pub fn builder() -> ConnectivityConfigBuilder {
        ConnectivityConfigBuilder::new()
    }

    /// Get the heartbeat interval.
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Get the weak threshold.
    pub fn weak_threshold(&self) -> Duration {
        self.weak_threshold
    }

    /// Get the probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Get the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`ConnectivityConfig`].
pub struct ConnectivityConfigBuilder {
    heartbeat_interval: Duration,
    weak_threshold: Duration,
    probe_timeout: Duration,
    initial_host_online: bool,
    event_listeners: EventListeners<ConnectivityEvent>,
    name: String,
}

impl ConnectivityConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            weak_threshold: Duration::from_millis(300),
            probe_timeout: Duration::from_secs(5),
            initial_host_online: true,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Set the interval between heartbeat probes.
    ///
    /// Values below [`MIN_HEARTBEAT_INTERVAL`] are raised to it.
    ///
    /// Default: 30 seconds
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval.max(MIN_HEARTBEAT_INTERVAL);
        self
    }

    /// Set the round-trip at which a reachable endpoint counts as weak.
    ///
    /// Default: 300 milliseconds
    pub fn weak_threshold(mut self, threshold: Duration) -> Self {
        self.weak_threshold = threshold;
        self
    }

    /// Set the timeout for a single probe. A timed-out probe counts as offline.
    ///
    /// Default: 5 seconds
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the host online flag assumed before the first signal arrives.
    ///
    /// Default: true
    pub fn initial_host_online(mut self, online: bool) -> Self {
        self.initial_host_online = online;
        self
    }

    /// Sets the name of this monitor for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback invoked with `(from, to)` on every state change.
    pub fn on_state_change<F>(mut self, f: F) -> Self
    where
        F: Fn(ConnectivityState, ConnectivityState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ConnectivityEvent::StateChanged { from, to, .. } = event {
                f(*from, *to);
            }
        }));
        self
    }

    /// Registers a callback invoked with the failure reason when a probe fails.
    pub fn on_probe_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ConnectivityEvent::ProbeFailed { reason, .. } = event {
                f(reason);
            }
        }));
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ConnectivityConfig {
        ConnectivityConfig {
            heartbeat_interval: self.heartbeat_interval,
            weak_threshold: self.weak_threshold,
            probe_timeout: self.probe_timeout,
            initial_host_online: self.initial_host_online,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for ConnectivityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
