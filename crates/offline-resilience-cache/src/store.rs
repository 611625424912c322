//! Cache storage with insertion-order eviction and stale windows.

use hashbrown::HashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Entry in the cache with its freshness deadlines.
///
/// A deadline of `None` lies beyond what an [`Instant`] can represent and is
/// never reached.
#[derive(Clone, Debug)]
pub(crate) struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    stale_until: Option<Instant>,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(value: V, now: Instant, ttl: Duration, stale_grace: Duration) -> Self {
        let expires_at = now.checked_add(ttl);
        Self {
            value,
            expires_at,
            stale_until: expires_at.and_then(|at| at.checked_add(stale_grace)),
        }
    }

    fn freshness(&self, now: Instant) -> Freshness {
        if self.expires_at.map_or(true, |at| now < at) {
            Freshness::Fresh
        } else if self.stale_until.map_or(true, |until| now < until) {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
    Expired,
}

/// Result of looking a key up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lookup<V> {
    Fresh(V),
    Stale(V),
    Absent,
}

/// Bounded map that evicts in insertion order.
///
/// Overwriting a key keeps its original position in the eviction order.
pub(crate) struct CacheStore<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V: Clone> CacheStore<K, V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Looks `key` up, dropping it if it is past its stale window.
    pub(crate) fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        let freshness = match self.entries.get(key) {
            Some(entry) => entry.freshness(now),
            None => return Lookup::Absent,
        };

        match freshness {
            Freshness::Expired => {
                self.remove(key);
                Lookup::Absent
            }
            Freshness::Fresh => self
                .entries
                .get(key)
                .map_or(Lookup::Absent, |e| Lookup::Fresh(e.value.clone())),
            Freshness::Stale => self
                .entries
                .get(key)
                .map_or(Lookup::Absent, |e| Lookup::Stale(e.value.clone())),
        }
    }

    /// Inserts or overwrites `key`. Returns the keys evicted for capacity.
    pub(crate) fn insert(&mut self, key: K, entry: CacheEntry<V>) -> Vec<K> {
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push_back(key);
        }

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    evicted.push(oldest);
                }
                None => break,
            }
        }
        evicted
    }

    pub(crate) fn remove(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Drops every entry past its stale window. Returns how many went.
    pub(crate) fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.freshness(now) != Freshness::Expired);
        let entries = &self.entries;
        self.order.retain(|k| entries.contains_key(k));
        before - self.entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
