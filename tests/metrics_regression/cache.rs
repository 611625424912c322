//! Cache metrics regression tests

use super::helpers::*;
use offline_resilience_cache::{Cache, CacheConfig};
use offline_resilience_core::OfflineError;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn cache_request_metrics() {
    init_recorder();

    let cache: Cache<u64, u64> = Cache::new(CacheConfig::builder().name("test_cache").build());
    cache.get(&1);
    cache
        .get_or_create(1, || async { Ok::<_, OfflineError>(10) })
        .await
        .unwrap();
    cache.get(&1);

    assert_counter_exists("cache_requests_total");
    assert_metric_has_label("cache_requests_total", "cache", "test_cache");
    assert_metric_has_label("cache_requests_total", "result", "hit");
    assert_metric_has_label("cache_requests_total", "result", "miss");

    assert_gauge_exists("cache_size");
    assert_metric_has_label("cache_size", "cache", "test_cache");
}

#[tokio::test]
#[serial]
async fn cache_eviction_metrics() {
    init_recorder();

    let cache: Cache<u64, u64> = Cache::new(
        CacheConfig::builder()
            .name("eviction_cache")
            .max_size(2)
            .build(),
    );
    for key in 0..5 {
        cache.set(key, key);
    }

    assert_counter_exists("cache_evictions_total");
    assert_metric_has_label("cache_evictions_total", "cache", "eviction_cache");
    assert_metric_has_label("cache_evictions_total", "reason", "capacity");
}
