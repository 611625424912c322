//! Configuration for cache.

use crate::events::{CacheEvent, EvictionReason};
use offline_resilience_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for [`Cache`](crate::Cache).
pub struct CacheConfig {
    pub(crate) max_size: usize,
    pub(crate) ttl: Duration,
    pub(crate) stale_grace: Duration,
    pub(crate) error_threshold: u32,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
    pub(crate) name: String,
}

impl CacheConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Maximum number of entries kept.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Time-to-live applied when a write does not specify one.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// How long an expired entry may still be served while it is refreshed.
    pub fn stale_grace(&self) -> Duration {
        self.stale_grace
    }

    /// Consecutive fetch failures after which a key is evicted.
    pub fn error_threshold(&self) -> u32 {
        self.error_threshold
    }

    /// Name of this cache instance.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfigBuilder::new().build()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    max_size: usize,
    ttl: Duration,
    stale_grace: Duration,
    error_threshold: u32,
    event_listeners: EventListeners<CacheEvent>,
    name: String,
}

impl CacheConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(5 * 60),
            stale_grace: Duration::from_secs(60),
            error_threshold: 3,
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    /// Sets the maximum number of entries in the cache.
    ///
    /// When a write pushes the size past this bound, the entry inserted
    /// earliest is evicted. Values below 1 are treated as 1.
    ///
    /// Default: 100
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size.max(1);
        self
    }

    /// Sets the default time-to-live for entries.
    ///
    /// Default: 5 minutes
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets how long past expiry an entry may still be served as stale.
    ///
    /// Default: 1 minute
    pub fn stale_grace(mut self, grace: Duration) -> Self {
        self.stale_grace = grace;
        self
    }

    /// Sets how many consecutive fetch failures evict a key.
    ///
    /// Default: 3
    pub fn error_threshold(mut self, threshold: u32) -> Self {
        self.error_threshold = threshold.max(1);
        self
    }

    /// Sets the name of this cache instance for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback to be invoked when a fresh entry is served.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Hit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when a stale entry is served.
    pub fn on_stale_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::StaleHit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when a cache miss occurs.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Miss { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback to be invoked when an entry is evicted.
    pub fn on_eviction<F>(mut self, f: F) -> Self
    where
        F: Fn(EvictionReason) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Eviction { reason, .. } = event {
                f(*reason);
            }
        }));
        self
    }

    /// Registers a callback to be invoked when a fetch fails.
    ///
    /// Receives the number of consecutive failures for the key.
    pub fn on_fetch_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::FetchFailed {
                consecutive_errors, ..
            } = event
            {
                f(*consecutive_errors);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CacheConfig {
        CacheConfig {
            max_size: self.max_size,
            ttl: self.ttl,
            stale_grace: self.stale_grace,
            error_threshold: self.error_threshold,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
