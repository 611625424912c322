//! Single-flight bookkeeping: at most one fetch per key at a time.

use hashbrown::HashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use tokio::sync::broadcast;

pub(crate) type Outcome<V, E> = Result<V, E>;

/// How a caller relates to the fetch for its key.
pub(crate) enum Role<V, E> {
    /// No fetch was running; the caller must start one.
    Leader(broadcast::Receiver<Outcome<V, E>>),
    /// A fetch is already running; wait for its result.
    Waiter(broadcast::Receiver<Outcome<V, E>>),
}

/// Map from key to the broadcast sender of that key's running fetch.
pub(crate) struct InFlight<K, V, E> {
    fetches: Mutex<HashMap<K, broadcast::Sender<Outcome<V, E>>>>,
}

impl<K, V, E> InFlight<K, V, E>
where
    K: Hash + Eq,
    V: Clone,
    E: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            fetches: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribes to the running fetch for `key`, or registers a new one.
    ///
    /// The receiver is created before the lock is released, so the result
    /// cannot be sent before the caller listens for it.
    pub(crate) fn join(&self, key: K) -> Role<V, E> {
        let mut fetches = self.fetches.lock();
        if let Some(sender) = fetches.get(&key) {
            Role::Waiter(sender.subscribe())
        } else {
            let (tx, rx) = broadcast::channel(1);
            fetches.insert(key, tx);
            Role::Leader(rx)
        }
    }

    /// Registers a fetch for `key` nobody waits on.
    ///
    /// Returns `false` if one is already running.
    pub(crate) fn try_lead(&self, key: K) -> bool {
        let mut fetches = self.fetches.lock();
        if fetches.contains_key(&key) {
            false
        } else {
            let (tx, _rx) = broadcast::channel(1);
            fetches.insert(key, tx);
            true
        }
    }

    /// Publishes the result to every waiter and forgets the fetch.
    pub(crate) fn complete(&self, key: &K, outcome: Outcome<V, E>) {
        let sender = self.fetches.lock().remove(key);
        if let Some(sender) = sender {
            // No receivers is fine: background refreshes have none.
            let _ = sender.send(outcome);
        }
    }

    /// Forgets the fetch without a result; waiters see the channel close.
    pub(crate) fn cancel(&self, key: &K) {
        self.fetches.lock().remove(key);
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.fetches.lock().contains_key(key)
    }
}
