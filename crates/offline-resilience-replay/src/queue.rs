//! The mutation queue and its drain loop.

use crate::config::ReplayConfig;
use crate::events::ReplayEvent;
use crate::executor::Executor;
use crate::request::{QueuedRequest, RequestId, RequestOptions};
use offline_resilience_core::{Classify, FailureKind};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Outcome of one [`MutationQueue::process`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Mutations sent successfully and removed.
    pub executed: usize,
    /// Mutations discarded after a non-connectivity failure.
    pub dropped: usize,
    /// `true` if a connectivity failure stopped the drain.
    pub halted: bool,
    /// `true` if another drain was already running and this call did nothing.
    pub skipped: bool,
    /// Mutations still queued when the call returned.
    pub remaining: usize,
}

struct Entry<P> {
    request: QueuedRequest<P>,
    /// Insertion position; kept across replacement.
    seq: u64,
    /// Bumped on replacement so an in-flight attempt can tell it went stale.
    revision: u64,
}

struct QueueState<P> {
    entries: Vec<Entry<P>>,
    next_id: u64,
    next_seq: u64,
}

impl<P> QueueState<P> {
    fn sort(&mut self) {
        self.entries
            .sort_by_key(|e| (Reverse(e.request.priority), e.seq));
    }

    fn contains(&self, id: RequestId) -> bool {
        self.entries.iter().any(|e| e.request.id == id)
    }

    /// First entry in drain order none of whose dependencies is still queued.
    fn next_eligible(&self) -> Option<&Entry<P>> {
        self.entries.iter().find(|entry| {
            entry
                .request
                .dependencies
                .iter()
                .all(|dep| *dep == entry.request.id || !self.contains(*dep))
        })
    }

    /// Removes `id` unless it was replaced after `revision` was read.
    fn settle(&mut self, id: RequestId, revision: u64) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.request.id == id && e.revision == revision));
        self.entries.len() != before
    }
}

/// A priority queue of mutations replayed through an [`Executor`].
///
/// At most one mutation per (endpoint, method) is queued: enqueueing the same
/// pair again replaces the payload and options in place, keeping the id and
/// the original position among equal priorities.
///
/// ```rust
/// use offline_resilience_core::OfflineError;
/// use offline_resilience_replay::{Method, MutationQueue, QueuedRequest, RequestOptions};
///
/// # async fn example() {
/// let queue = MutationQueue::new(|request: QueuedRequest<String>| async move {
///     println!("sending {}", request.payload());
///     Ok::<(), OfflineError>(())
/// });
///
/// let create = queue.enqueue("/todos", RequestOptions::new(Method::Post), "milk".to_string());
/// queue.enqueue(
///     "/todos/1/done",
///     RequestOptions::new(Method::Put).depends_on(create),
///     "true".to_string(),
/// );
///
/// let report = queue.process().await;
/// assert_eq!(report.executed, 2);
/// # }
/// ```
pub struct MutationQueue<P, X> {
    executor: X,
    state: Mutex<QueueState<P>>,
    draining: AtomicBool,
    config: ReplayConfig,
}

impl<P, X> MutationQueue<P, X>
where
    P: Clone + Send,
    X: Executor<P>,
{
    /// Creates a queue with the default configuration.
    pub fn new(executor: X) -> Self {
        Self::with_config(executor, ReplayConfig::default())
    }

    /// Creates a queue with `config`.
    pub fn with_config(executor: X, config: ReplayConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "replay_requests_total",
                "Total number of replayed mutations by outcome (executed, dropped, halted)"
            );
        }

        Self {
            executor,
            state: Mutex::new(QueueState {
                entries: Vec::new(),
                next_id: 0,
                next_seq: 0,
            }),
            draining: AtomicBool::new(false),
            config,
        }
    }

    /// Queues `payload` for `endpoint`, replacing any queued mutation with
    /// the same endpoint and method.
    pub fn enqueue(
        &self,
        endpoint: impl Into<String>,
        options: RequestOptions,
        payload: P,
    ) -> RequestId {
        let endpoint = endpoint.into();
        let RequestOptions {
            method,
            priority,
            dependencies,
        } = options;

        let (id, replaced) = {
            let mut state = self.state.lock();
            let existing = state
                .entries
                .iter_mut()
                .find(|e| e.request.endpoint == endpoint && e.request.method == method);

            let outcome = match existing {
                Some(entry) => {
                    entry.request.priority = priority;
                    entry.request.dependencies = dependencies;
                    entry.request.payload = payload;
                    entry.revision += 1;
                    (entry.request.id, true)
                }
                None => {
                    let id = RequestId(state.next_id);
                    let seq = state.next_seq;
                    state.next_id += 1;
                    state.next_seq += 1;
                    state.entries.push(Entry {
                        request: QueuedRequest {
                            id,
                            endpoint: endpoint.clone(),
                            method,
                            priority,
                            dependencies,
                            payload,
                        },
                        seq,
                        revision: 0,
                    });
                    (id, false)
                }
            };
            state.sort();
            outcome
        };

        #[cfg(feature = "tracing")]
        debug!(
            queue = %self.config.name,
            request_id = id.get(),
            %endpoint,
            %method,
            replaced,
            "Mutation queued"
        );

        let pattern_name = self.config.name.clone();
        let timestamp = std::time::Instant::now();
        let event = if replaced {
            ReplayEvent::Replaced {
                pattern_name,
                timestamp,
                request_id: id,
                endpoint,
                method,
            }
        } else {
            ReplayEvent::Enqueued {
                pattern_name,
                timestamp,
                request_id: id,
                endpoint,
                method,
            }
        };
        self.config.event_listeners.emit(&event);

        id
    }

    /// Replays queued mutations until the queue is empty, nothing left is
    /// eligible, or a connectivity failure occurs.
    ///
    /// Mutations are attempted one at a time in priority order. A mutation
    /// whose dependencies are still queued is skipped until they leave. Only
    /// one drain runs at a time; a concurrent call returns immediately with
    /// [`DrainReport::skipped`] set.
    pub async fn process(&self) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return DrainReport {
                skipped: true,
                remaining: self.len(),
                ..DrainReport::default()
            };
        }
        let _guard = DrainGuard(&self.draining);

        let mut report = DrainReport::default();
        loop {
            let next = self
                .state
                .lock()
                .next_eligible()
                .map(|e| (e.request.clone(), e.revision));
            let Some((request, revision)) = next else {
                break;
            };
            let id = request.id;

            match self.executor.execute(request).await {
                Ok(()) => {
                    self.state.lock().settle(id, revision);
                    report.executed += 1;
                    self.record_executed(id);
                }
                Err(err) => {
                    let kind = err.failure_kind();
                    if kind.is_connectivity() {
                        report.halted = true;
                        self.record_halted(id);
                        break;
                    }
                    if self.state.lock().settle(id, revision) {
                        report.dropped += 1;
                        self.record_dropped(id, kind);
                    }
                }
            }
        }

        report.remaining = self.len();
        report
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `id` is still queued.
    pub fn contains(&self, id: RequestId) -> bool {
        self.state.lock().contains(id)
    }

    /// Snapshot of queued mutations in drain order.
    pub fn pending(&self) -> Vec<QueuedRequest<P>> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| e.request.clone())
            .collect()
    }

    /// Removes every queued mutation.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Returns `true` while a drain is running.
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// The configuration this queue was built with.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    fn record_executed(&self, id: RequestId) {
        #[cfg(feature = "metrics")]
        counter!("replay_requests_total", "queue" => self.config.name.clone(), "outcome" => "executed")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(queue = %self.config.name, request_id = id.get(), "Mutation replayed");

        self.config.event_listeners.emit(&ReplayEvent::Executed {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            request_id: id,
        });
    }

    fn record_dropped(&self, id: RequestId, kind: FailureKind) {
        #[cfg(feature = "metrics")]
        counter!("replay_requests_total", "queue" => self.config.name.clone(), "outcome" => "dropped")
            .increment(1);

        #[cfg(feature = "tracing")]
        warn!(queue = %self.config.name, request_id = id.get(), ?kind, "Mutation dropped");

        self.config.event_listeners.emit(&ReplayEvent::Dropped {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            request_id: id,
            kind,
        });
    }

    fn record_halted(&self, id: RequestId) {
        let remaining = self.len();

        #[cfg(feature = "metrics")]
        counter!("replay_requests_total", "queue" => self.config.name.clone(), "outcome" => "halted")
            .increment(1);

        #[cfg(feature = "tracing")]
        info!(
            queue = %self.config.name,
            request_id = id.get(),
            remaining,
            "Connectivity lost, replay halted"
        );

        self.config.event_listeners.emit(&ReplayEvent::Halted {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            request_id: id,
            remaining,
        });
    }
}

/// Clears the drain flag when the drain ends or its future is dropped.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
