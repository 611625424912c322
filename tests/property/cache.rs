//! Property tests for the single-level cache.
//!
//! Invariants tested:
//! - The entry count never exceeds max_size
//! - The most recent insertions are the ones kept
//! - A deleted key is never returned

use offline_resilience_cache::{Cache, CacheConfig};
use proptest::prelude::*;
use std::collections::VecDeque;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Delete(u8),
    Get(u8),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..20, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        1 => (0u8..20).prop_map(Op::Delete),
        2 => (0u8..20).prop_map(Op::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: size stays bounded and matches a FIFO model
    #[test]
    fn cache_matches_insertion_order_model(
        max_size in 1usize..8,
        ops in prop::collection::vec(op(), 1..100),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let cache: Cache<u8, u32> =
                Cache::new(CacheConfig::builder().max_size(max_size).build());
            // (key, value) in insertion order; overwrites keep their slot.
            let mut model: VecDeque<(u8, u32)> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        cache.set(k, v);
                        if let Some(slot) = model.iter_mut().find(|(key, _)| *key == k) {
                            slot.1 = v;
                        } else {
                            model.push_back((k, v));
                            if model.len() > max_size {
                                model.pop_front();
                            }
                        }
                    }
                    Op::Delete(k) => {
                        let expected = model.iter().any(|(key, _)| *key == k);
                        prop_assert_eq!(cache.delete(&k), expected);
                        model.retain(|(key, _)| *key != k);
                    }
                    Op::Get(k) => {
                        let expected = model.iter().find(|(key, _)| *key == k).map(|(_, v)| *v);
                        prop_assert_eq!(cache.get(&k), expected);
                    }
                }
                prop_assert!(cache.len() <= max_size);
                prop_assert_eq!(cache.len(), model.len());
            }

            Ok(())
        })?;
    }
}
