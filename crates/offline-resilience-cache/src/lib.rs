//! Single-flight, stale-while-revalidate caching.
//!
//! [`Cache`] is an in-memory map with a default TTL, a grace window during
//! which expired entries may still be served, and a bound on size that
//! evicts in insertion order.
//!
//! # Features
//!
//! - **Single-flight fetches**: concurrent misses for one key share one fetch
//! - **Stale-while-revalidate**: expired entries inside the grace window are
//!   served immediately while a background refresh runs
//! - **Error eviction**: a key whose fetch keeps failing is evicted after a
//!   configurable number of consecutive failures
//! - **Tiered composition**: [`TieredCache`] puts the cache in front of any
//!   [`RemoteCache`]
//! - **Event System**: hit, stale hit, miss, eviction and fetch failure events
//!
//! # Examples
//!
//! ```
//! use offline_resilience_cache::{Cache, CacheConfig};
//! use offline_resilience_core::OfflineError;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache: Cache<String, String> = Cache::new(
//!     CacheConfig::builder()
//!         .name("profiles")
//!         .max_size(500)
//!         .ttl(Duration::from_secs(60))
//!         .stale_grace(Duration::from_secs(30))
//!         .on_miss(|| println!("Cache miss!"))
//!         .build(),
//! );
//!
//! let profile = cache
//!     .get_or_create("user-1".to_string(), || async {
//!         Ok::<_, OfflineError>("Ada".to_string())
//!     })
//!     .await?;
//! assert_eq!(profile, "Ada");
//! # Ok(())
//! # }
//! ```

mod cache;
mod config;
mod error;
mod events;
mod inflight;
mod stats;
mod store;
mod tiered;

pub use cache::Cache;
pub use config::{CacheConfig, CacheConfigBuilder};
pub use error::CacheError;
pub use events::{CacheEvent, EvictionReason};
pub use stats::CacheMetrics;
pub use tiered::{NoRemote, RemoteCache, TieredCache};
