//! Local cache in front of an optional remote cache.

use crate::cache::Cache;
use crate::error::CacheError;
use crate::stats::{CacheMetrics, HitCounters};
use offline_resilience_core::OfflineError;
use std::convert::Infallible;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::warn;

/// A second, slower cache tier such as a shared key-value store.
///
/// Failures are never surfaced to callers of [`TieredCache`]; they are
/// logged and treated as a miss or a skipped write.
pub trait RemoteCache<K, V>: Send + Sync {
    /// Error type of the remote store.
    type Error: std::fmt::Display + Send;

    /// Reads `key`. `Ok(None)` is a miss.
    fn get(&self, key: &K) -> impl Future<Output = Result<Option<V>, Self::Error>> + Send;

    /// Writes `value` under `key`, expiring after `ttl`.
    fn set(
        &self,
        key: &K,
        value: &V,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes `key`.
    fn delete(&self, key: &K) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<K, V, R> RemoteCache<K, V> for Arc<R>
where
    R: RemoteCache<K, V>,
    K: Sync,
    V: Sync,
{
    type Error = R::Error;

    fn get(&self, key: &K) -> impl Future<Output = Result<Option<V>, Self::Error>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &K,
        value: &V,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &K) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).delete(key)
    }
}

/// A remote tier that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl<K: Sync, V: Send + Sync> RemoteCache<K, V> for NoRemote {
    type Error = Infallible;

    async fn get(&self, _key: &K) -> Result<Option<V>, Infallible> {
        Ok(None)
    }

    async fn set(&self, _key: &K, _value: &V, _ttl: Duration) -> Result<(), Infallible> {
        Ok(())
    }

    async fn delete(&self, _key: &K) -> Result<(), Infallible> {
        Ok(())
    }
}

/// A [`Cache`] backed by a [`RemoteCache`].
///
/// Reads go local first, then remote; a remote hit is copied into the local
/// tier. Writes and deletes go to both tiers. There is no cross-tier lock, so
/// two racing misses may both fetch; the last write wins.
///
/// ```rust
/// use offline_resilience_cache::{Cache, CacheConfig, NoRemote, TieredCache};
///
/// # async fn example() {
/// let tiered: TieredCache<String, u32> =
///     TieredCache::new(Cache::new(CacheConfig::default()), None::<NoRemote>);
///
/// tiered.set("answer".to_string(), 42, None).await;
/// assert_eq!(tiered.get(&"answer".to_string()).await, Some(42));
/// # }
/// ```
pub struct TieredCache<K, V, R = NoRemote, E = OfflineError> {
    local: Cache<K, V, E>,
    remote: Option<R>,
    counters: HitCounters,
}

impl<K, V, R, E> TieredCache<K, V, R, E>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
    R: RemoteCache<K, V>,
{
    /// Composes `local` with an optional `remote` tier.
    pub fn new(local: Cache<K, V, E>, remote: Option<R>) -> Self {
        Self {
            local,
            remote,
            counters: HitCounters::default(),
        }
    }

    /// Looks `key` up locally, then remotely.
    pub async fn get(&self, key: &K) -> Option<V> {
        if let Some(value) = self.local.get(key) {
            self.counters.hit();
            return Some(value);
        }

        if let Some(remote) = &self.remote {
            match remote.get(key).await {
                Ok(Some(value)) => {
                    self.local.set(key.clone(), value.clone());
                    self.counters.hit();
                    return Some(value);
                }
                Ok(None) => {}
                Err(err) => self.remote_failed("get", &err),
            }
        }

        self.counters.miss();
        None
    }

    /// Writes through both tiers. `None` uses the local default TTL.
    pub async fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or_else(|| self.local.config().ttl());
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.set(&key, &value, ttl).await {
                self.remote_failed("set", &err);
            }
        }
        self.local.set_with_ttl(key, value, ttl);
    }

    /// Removes `key` from both tiers.
    pub async fn delete(&self, key: &K) {
        self.local.delete(key);
        if let Some(remote) = &self.remote {
            if let Err(err) = remote.delete(key).await {
                self.remote_failed("delete", &err);
            }
        }
    }

    /// Returns the value from either tier, or fetches it and writes it to both.
    pub async fn get_or_create<F, Fut>(
        &self,
        key: K,
        fetcher: F,
        ttl: Option<Duration>,
    ) -> Result<V, CacheError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = fetcher().await.map_err(CacheError::Fetch)?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }

    /// Hits and misses across both tiers.
    pub fn metrics(&self) -> CacheMetrics {
        self.counters.snapshot()
    }

    /// Zeroes the cross-tier hit/miss counts.
    pub fn reset_metrics(&self) {
        self.counters.reset();
    }

    /// The local tier.
    pub fn local(&self) -> &Cache<K, V, E> {
        &self.local
    }

    fn remote_failed(&self, operation: &'static str, err: &R::Error) {
        #[cfg(feature = "tracing")]
        warn!(
            cache = %self.local.config().name(),
            operation,
            error = %err,
            "Remote cache failed, continuing with local tier"
        );

        #[cfg(not(feature = "tracing"))]
        let _ = (operation, err);
    }
}
