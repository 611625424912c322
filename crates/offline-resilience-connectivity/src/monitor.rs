//! The connectivity monitor and its heartbeat task.

use crate::{ConnectivityConfig, ConnectivityEvent, ConnectivityState, Probe, ProbeError};
use offline_resilience_core::{EventListeners, FnListener, ListenerId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Point-in-time view of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivitySnapshot {
    /// Current classification.
    pub state: ConnectivityState,
    /// Round-trip of the last successful probe; `None` while offline.
    pub latency: Option<Duration>,
    /// When the state was last evaluated; `None` before the first evaluation.
    pub checked_at: Option<Instant>,
}

type SharedListeners = Arc<RwLock<EventListeners<ConnectivityEvent>>>;

struct Applied {
    snapshot: ConnectivitySnapshot,
    generation: u64,
}

struct Shared<P> {
    probe: P,
    config: ConnectivityConfig,
    host_online: AtomicBool,
    /// Bumped for every evaluation; results from older evaluations are discarded.
    generation: AtomicU64,
    current: Mutex<Applied>,
    subscribers: SharedListeners,
    state_tx: watch::Sender<ConnectivityState>,
}

impl<P: Probe> Shared<P> {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    async fn evaluate(&self) -> ConnectivityState {
        let generation = self.next_generation();
        if !self.host_online.load(Ordering::Acquire) {
            return self.apply(generation, ConnectivityState::Offline, None);
        }

        let timeout = self.config.probe_timeout;
        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, self.probe.probe()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::TimedOut(timeout)),
        };
        let rtt = started.elapsed();

        match outcome {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                debug!(monitor = %self.config.name, rtt_ms = rtt.as_millis() as u64, "Probe succeeded");

                self.emit(&ConnectivityEvent::ProbeSucceeded {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    latency: rtt,
                });

                let state = if rtt < self.config.weak_threshold {
                    ConnectivityState::Strong
                } else {
                    ConnectivityState::Weak
                };
                self.apply(generation, state, Some(rtt))
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                debug!(monitor = %self.config.name, error = %err, "Probe failed");

                self.emit(&ConnectivityEvent::ProbeFailed {
                    pattern_name: self.config.name.clone(),
                    timestamp: std::time::Instant::now(),
                    reason: err.to_string(),
                });
                self.apply(generation, ConnectivityState::Offline, None)
            }
        }
    }

    /// Records an evaluation result and notifies on a net change.
    fn apply(
        &self,
        generation: u64,
        state: ConnectivityState,
        latency: Option<Duration>,
    ) -> ConnectivityState {
        // The host flag going false always wins over a probe that raced it.
        let state = if self.host_online.load(Ordering::Acquire) {
            state
        } else {
            ConnectivityState::Offline
        };
        let latency = latency.filter(|_| state.is_online());

        let previous = {
            let mut current = self.current.lock();
            if generation < current.generation {
                return current.snapshot.state;
            }
            let previous = current.snapshot.state;
            let first = current.snapshot.checked_at.is_none();
            current.generation = generation;
            current.snapshot = ConnectivitySnapshot {
                state,
                latency,
                checked_at: Some(Instant::now()),
            };
            // The first evaluation is published even when it confirms the
            // assumed state, so watchers can tell a verified state apart.
            self.state_tx.send_if_modified(|s| {
                let changed = first || *s != state;
                *s = state;
                changed
            });
            previous
        };

        if previous != state {
            #[cfg(feature = "tracing")]
            info!(monitor = %self.config.name, from = %previous, to = %state, "Connectivity changed");

            self.emit(&ConnectivityEvent::StateChanged {
                pattern_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                from: previous,
                to: state,
                latency,
            });
        }
        state
    }

    fn emit(&self, event: &ConnectivityEvent) {
        self.config.event_listeners.emit(event);
        // Clone so a listener may unsubscribe from inside its callback.
        let subscribers = self.subscribers.read().clone();
        subscribers.emit(event);
    }
}

/// Handle returned by [`ConnectivityMonitor::on_change`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    listeners: Weak<RwLock<EventListeners<ConnectivityEvent>>>,
    id: ListenerId,
}

impl Subscription {
    /// Removes the listener. Returns `false` if the monitor is already gone.
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => listeners.write().remove(self.id),
            None => false,
        }
    }
}

/// Classifies reachability from the host signal plus an active probe.
///
/// The monitor owns its heartbeat task: [`start`](Self::start) spawns it,
/// [`stop`](Self::stop) or dropping the monitor aborts it.
pub struct ConnectivityMonitor<P> {
    shared: Arc<Shared<P>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl<P> ConnectivityMonitor<P>
where
    P: Probe + 'static,
{
    /// Creates a monitor. No probe runs until [`start`](Self::start),
    /// [`check_now`](Self::check_now) or a host signal.
    ///
    /// Until then the state mirrors the host flag unverified and
    /// [`is_verified`](Self::is_verified) returns `false`.
    pub fn new(probe: P, config: ConnectivityConfig) -> Self {
        let host_online = config.initial_host_online;
        let state = if host_online {
            ConnectivityState::Strong
        } else {
            ConnectivityState::Offline
        };
        let (state_tx, _) = watch::channel(state);

        let shared = Shared {
            probe,
            config,
            host_online: AtomicBool::new(host_online),
            generation: AtomicU64::new(0),
            current: Mutex::new(Applied {
                snapshot: ConnectivitySnapshot {
                    state,
                    latency: None,
                    checked_at: None,
                },
                generation: 0,
            }),
            subscribers: Arc::new(RwLock::new(EventListeners::new())),
            state_tx,
        };

        Self {
            shared: Arc::new(shared),
            heartbeat: Mutex::new(None),
        }
    }

    /// Starts the heartbeat. The first probe runs immediately.
    ///
    /// Calling `start` again restarts the heartbeat. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) {
        let shared = Arc::clone(&self.shared);
        let period = shared.config.heartbeat_interval;

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                shared.evaluate().await;
            }
        });

        if let Some(previous) = self.heartbeat.lock().replace(task) {
            previous.abort();
        }
    }

    /// Stops the heartbeat. In-flight probes started by it are abandoned.
    pub fn stop(&self) {
        if let Some(task) = self.heartbeat.lock().take() {
            task.abort();
        }
    }

    /// Returns `true` while the heartbeat task is running.
    pub fn is_running(&self) -> bool {
        self.heartbeat
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Feeds the host's raw online/offline signal.
    ///
    /// Going offline takes effect immediately. Coming back online is not
    /// trusted: it triggers a probe and the probe decides the new state.
    pub async fn host_signal(&self, online: bool) -> ConnectivityState {
        let was_online = self.shared.host_online.swap(online, Ordering::AcqRel);

        if !online {
            let generation = self.shared.next_generation();
            return self
                .shared
                .apply(generation, ConnectivityState::Offline, None);
        }

        if was_online {
            self.state()
        } else {
            self.shared.evaluate().await
        }
    }

    /// Probes right now and returns the resulting state.
    pub async fn check_now(&self) -> ConnectivityState {
        self.shared.evaluate().await
    }

    /// Current state.
    pub fn state(&self) -> ConnectivityState {
        self.shared.current.lock().snapshot.state
    }

    /// Round-trip of the last successful probe, `None` while offline.
    pub fn latency(&self) -> Option<Duration> {
        self.shared.current.lock().snapshot.latency
    }

    /// State, latency and evaluation time together.
    pub fn snapshot(&self) -> ConnectivitySnapshot {
        self.shared.current.lock().snapshot
    }

    /// Returns `true` once any evaluation has run.
    ///
    /// An online state is only ever trustworthy when this is `true`.
    pub fn is_verified(&self) -> bool {
        self.shared.current.lock().snapshot.checked_at.is_some()
    }

    /// Last raw signal received from the host.
    pub fn is_host_online(&self) -> bool {
        self.shared.host_online.load(Ordering::Acquire)
    }

    /// Registers a listener invoked with the new state on every change.
    ///
    /// Re-probes that confirm the current state do not invoke it.
    pub fn on_change<F>(&self, f: F) -> Subscription
    where
        F: Fn(ConnectivityState) + Send + Sync + 'static,
    {
        let id = self
            .shared
            .subscribers
            .write()
            .add(FnListener::new(move |event: &ConnectivityEvent| {
                if let ConnectivityEvent::StateChanged { to, .. } = event {
                    f(*to);
                }
            }));

        Subscription {
            listeners: Arc::downgrade(&self.shared.subscribers),
            id,
        }
    }

    /// Returns a receiver that observes every state change.
    ///
    /// The first evaluation always notifies, even when it confirms the state
    /// assumed at construction.
    pub fn watch(&self) -> watch::Receiver<ConnectivityState> {
        self.shared.state_tx.subscribe()
    }

    /// The monitor's configuration.
    pub fn config(&self) -> &ConnectivityConfig {
        &self.shared.config
    }
}

impl<P> Drop for ConnectivityMonitor<P> {
    fn drop(&mut self) {
        if let Some(task) = self.heartbeat.get_mut().take() {
            task.abort();
        }
    }
}
