//! The single-level cache.

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::events::{CacheEvent, EvictionReason};
use crate::inflight::{InFlight, Outcome, Role};
use crate::stats::{CacheMetrics, HitCounters};
use crate::store::{CacheEntry, CacheStore, Lookup};
use hashbrown::HashMap;
use offline_resilience_core::OfflineError;
use parking_lot::Mutex;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// An in-memory cache with single-flight fetches and stale-while-revalidate.
///
/// Cloning is cheap; clones share the same entries.
///
/// `E` is the error type of the fetchers passed to
/// [`get_or_create`](Cache::get_or_create). It must be `Clone` because a
/// failed fetch is reported to every caller that waited on it.
pub struct Cache<K, V, E = OfflineError> {
    inner: Arc<Inner<K, V, E>>,
}

struct Inner<K, V, E> {
    config: CacheConfig,
    store: Mutex<CacheStore<K, V>>,
    errors: Mutex<HashMap<K, u32>>,
    in_flight: InFlight<K, V, E>,
    counters: HitCounters,
}

/// Outcome of joining the fetch for a missed key.
enum Joined<V, E> {
    /// Another fetch stored the value in the meantime.
    Filled(V),
    Wait(broadcast::Receiver<Outcome<V, E>>),
    Lead(broadcast::Receiver<Outcome<V, E>>),
}

impl<K, V, E> Clone for Cache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E> Default for Cache<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<K, V, E> Cache<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Creates a cache from `config`.
    pub fn new(config: CacheConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "cache_requests_total",
                "Total number of cache lookups (hit, stale_hit or miss)"
            );
            describe_counter!(
                "cache_evictions_total",
                "Total number of entries evicted before their stale window ended"
            );
            describe_gauge!("cache_size", "Current number of entries in the cache");
        }

        let store = CacheStore::new(config.max_size);
        Self {
            inner: Arc::new(Inner {
                config,
                store: Mutex::new(store),
                errors: Mutex::new(HashMap::new()),
                in_flight: InFlight::new(),
                counters: HitCounters::default(),
            }),
        }
    }

    /// Returns the value for `key` if it is fresh or within its stale window.
    ///
    /// Entries past their stale window are removed.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.inner.lookup(key) {
            Lookup::Fresh(value) => {
                self.inner.record_hit();
                Some(value)
            }
            Lookup::Stale(value) => {
                self.inner.record_stale_hit();
                Some(value)
            }
            Lookup::Absent => {
                self.inner.record_miss();
                None
            }
        }
    }

    /// Stores `value` with the configured default TTL.
    pub fn set(&self, key: K, value: V) {
        self.inner.insert(key, value, self.inner.config.ttl);
    }

    /// Stores `value`, fresh for `ttl`.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        self.inner.insert(key, value, ttl);
    }

    /// Removes `key`. Returns `true` if an entry was present.
    pub fn delete(&self, key: &K) -> bool {
        let removed = self.inner.store.lock().remove(key);
        self.inner.errors.lock().remove(key);
        self.inner.report_size();
        removed
    }

    /// Returns the cached value, fetching it if needed, using the default TTL.
    ///
    /// See [`get_or_create_with_ttl`](Cache::get_or_create_with_ttl).
    pub async fn get_or_create<F, Fut>(&self, key: K, fetcher: F) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let ttl = self.inner.config.ttl;
        self.get_or_create_with_ttl(key, ttl, fetcher).await
    }

    /// Returns the cached value, fetching it if needed.
    ///
    /// - A fresh entry is returned without calling `fetcher`.
    /// - A stale entry is returned immediately, and a background refresh
    ///   runs `fetcher` unless one is already running for `key`.
    /// - Otherwise the caller waits on a fetch. Concurrent callers for the
    ///   same key share one fetch and all receive its result or its error.
    ///
    /// Fetches run on their own task, so they finish and populate the cache
    /// even if every caller stops waiting.
    pub async fn get_or_create_with_ttl<F, Fut>(
        &self,
        key: K,
        ttl: Duration,
        fetcher: F,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        match self.inner.lookup(&key) {
            Lookup::Fresh(value) => {
                self.inner.record_hit();
                Ok(value)
            }
            Lookup::Stale(value) => {
                self.inner.record_stale_hit();
                if self.inner.in_flight.try_lead(key.clone()) {
                    #[cfg(feature = "tracing")]
                    debug!(cache = %self.inner.config.name, "Serving stale entry, refreshing in background");
                    Inner::spawn_fetch(&self.inner, key, ttl, fetcher);
                }
                Ok(value)
            }
            Lookup::Absent => {
                self.inner.record_miss();
                let mut receiver = match self.inner.join_after_miss(&key) {
                    Joined::Filled(value) => return Ok(value),
                    Joined::Wait(receiver) => receiver,
                    Joined::Lead(receiver) => {
                        Inner::spawn_fetch(&self.inner, key, ttl, fetcher);
                        receiver
                    }
                };

                match receiver.recv().await {
                    Ok(outcome) => outcome.map_err(CacheError::Fetch),
                    Err(_) => Err(CacheError::FetchAborted),
                }
            }
        }
    }

    /// Returns `true` while a fetch for `key` is running.
    pub fn is_fetching(&self, key: &K) -> bool {
        self.inner.in_flight.contains(key)
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry and error count. Running fetches still complete.
    pub fn clear(&self) {
        self.inner.store.lock().clear();
        self.inner.errors.lock().clear();
        self.inner.report_size();
    }

    /// Drops every entry past its stale window. Returns how many went.
    pub fn purge_expired(&self) -> usize {
        let purged = self.inner.store.lock().purge_expired(Instant::now());
        self.inner.report_size();
        purged
    }

    /// Cumulative hit/miss counts.
    pub fn metrics(&self) -> CacheMetrics {
        self.inner.counters.snapshot()
    }

    /// Zeroes the hit/miss counts.
    pub fn reset_metrics(&self) {
        self.inner.counters.reset();
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }
}

impl<K, V, E> Inner<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn lookup(&self, key: &K) -> Lookup<V> {
        self.store.lock().lookup(key, Instant::now())
    }

    fn insert(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry::new(value, Instant::now(), ttl, self.config.stale_grace);
        self.errors.lock().remove(&key);
        let evicted = self.store.lock().insert(key, entry);

        for key in &evicted {
            self.errors.lock().remove(key);
            self.record_eviction(EvictionReason::Capacity);
        }
        self.report_size();
    }

    /// Joins or starts the fetch for a key that just missed.
    ///
    /// A fetch that finished between the miss and the join has already
    /// stored its value, so a new leader re-reads the store before fetching.
    fn join_after_miss(&self, key: &K) -> Joined<V, E> {
        match self.in_flight.join(key.clone()) {
            Role::Waiter(receiver) => Joined::Wait(receiver),
            Role::Leader(receiver) => match self.lookup(key) {
                Lookup::Fresh(value) => {
                    self.in_flight.complete(key, Ok(value.clone()));
                    Joined::Filled(value)
                }
                _ => Joined::Lead(receiver),
            },
        }
    }

    fn spawn_fetch<F, Fut>(this: &Arc<Self>, key: K, ttl: Duration, fetcher: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let guard = FetchGuard {
            inner: Arc::clone(this),
            key: Some(key),
            ttl,
        };
        tokio::spawn(async move {
            let outcome = fetcher().await;
            guard.finish(outcome);
        });
    }

    fn finish(&self, key: K, ttl: Duration, outcome: Outcome<V, E>) {
        match &outcome {
            Ok(value) => self.insert(key.clone(), value.clone(), ttl),
            Err(_) => self.record_failure(&key),
        }
        self.in_flight.complete(&key, outcome);
    }

    fn record_failure(&self, key: &K) {
        let consecutive_errors = {
            let mut errors = self.errors.lock();
            let count = errors.entry(key.clone()).or_insert(0);
            *count += 1;
            *count
        };

        #[cfg(feature = "tracing")]
        warn!(
            cache = %self.config.name,
            consecutive_errors,
            "Cache fetch failed"
        );

        self.emit(CacheEvent::FetchFailed {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            consecutive_errors,
        });

        if consecutive_errors >= self.config.error_threshold {
            self.errors.lock().remove(key);
            let removed = self.store.lock().remove(key);
            if removed {
                self.record_eviction(EvictionReason::RepeatedFetchErrors);
                self.report_size();
            }
        }
    }

    fn record_hit(&self) {
        self.counters.hit();

        #[cfg(feature = "metrics")]
        counter!("cache_requests_total", "cache" => self.config.name.clone(), "result" => "hit")
            .increment(1);

        self.emit(CacheEvent::Hit {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
        });
    }

    fn record_stale_hit(&self) {
        self.counters.hit();

        #[cfg(feature = "metrics")]
        counter!("cache_requests_total", "cache" => self.config.name.clone(), "result" => "stale_hit")
            .increment(1);

        self.emit(CacheEvent::StaleHit {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
        });
    }

    fn record_miss(&self) {
        self.counters.miss();

        #[cfg(feature = "metrics")]
        counter!("cache_requests_total", "cache" => self.config.name.clone(), "result" => "miss")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(cache = %self.config.name, "Cache miss");

        self.emit(CacheEvent::Miss {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
        });
    }

    fn record_eviction(&self, reason: EvictionReason) {
        #[cfg(feature = "metrics")]
        {
            let reason_label = match reason {
                EvictionReason::Capacity => "capacity",
                EvictionReason::RepeatedFetchErrors => "errors",
            };
            counter!("cache_evictions_total", "cache" => self.config.name.clone(), "reason" => reason_label)
                .increment(1);
        }

        #[cfg(feature = "tracing")]
        debug!(cache = %self.config.name, ?reason, "Cache entry evicted");

        self.emit(CacheEvent::Eviction {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            reason,
        });
    }

    fn report_size(&self) {
        #[cfg(feature = "metrics")]
        {
            let size = self.store.lock().len();
            gauge!("cache_size", "cache" => self.config.name.clone()).set(size as f64);
        }
    }

    fn emit(&self, event: CacheEvent) {
        self.config.event_listeners.emit(&event);
    }
}

/// Owns a registered fetch until its result is published.
///
/// If the fetch task unwinds, dropping the guard unregisters the fetch so
/// waiters are released and later callers can start a new one.
struct FetchGuard<K: Hash + Eq, V: Clone, E: Clone> {
    inner: Arc<Inner<K, V, E>>,
    key: Option<K>,
    ttl: Duration,
}

impl<K, V, E> FetchGuard<K, V, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn finish(mut self, outcome: Outcome<V, E>) {
        if let Some(key) = self.key.take() {
            self.inner.finish(key, self.ttl, outcome);
        }
    }
}

impl<K: Hash + Eq, V: Clone, E: Clone> Drop for FetchGuard<K, V, E> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.inner.in_flight.cancel(&key);
        }
    }
}
