//! The durable error report queue.

use crate::config::ReportingConfig;
use crate::entry::{ErrorId, Priority, QueuedError, SerializedError};
use crate::error::ReportingError;
use crate::events::ReportEvent;
use crate::processor::ErrorProcessor;
use crate::store::DurableStore;
use offline_resilience_core::OfflineError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Outcome of one [`ErrorReportQueue::process`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Reports delivered and removed.
    pub delivered: usize,
    /// Reports that failed and were given a later retry time.
    pub rescheduled: usize,
    /// Reports removed for running out of attempts.
    pub dropped: usize,
    /// Reports left untouched because their retry time is in the future.
    pub deferred: usize,
    /// `true` if another `process` call was running and this one did nothing.
    pub skipped: bool,
}

/// A persisted queue of error reports awaiting delivery.
///
/// Every change is written to the [`DurableStore`] before the call that made
/// it returns, so reports survive restarts. Delivery happens in
/// [`process`](Self::process): critical reports first, then by enqueue order,
/// with exponential backoff after each failure.
///
/// ```rust
/// use offline_resilience_reporting::{ErrorReportQueue, MemoryStore, Priority, SerializedError};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = ErrorReportQueue::new(MemoryStore::new());
/// queue.enqueue(SerializedError::new("checkout failed"), Priority::Critical)?;
///
/// let report = queue
///     .process(&|report: SerializedError| async move {
///         println!("sending {}", report);
///         Ok::<(), String>(())
///     })
///     .await;
/// assert_eq!(report.delivered, 1);
/// # Ok(())
/// # }
/// ```
pub struct ErrorReportQueue<S> {
    store: S,
    config: ReportingConfig,
    /// Serializes every load-modify-flush cycle. Guards the next id to hand
    /// out, so an id is never reused while the queue lives, even across
    /// [`clear`](Self::clear).
    io: Mutex<u64>,
    processing: AtomicBool,
}

impl<S: DurableStore> ErrorReportQueue<S> {
    /// Creates a queue over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ReportingConfig::default())
    }

    /// Creates a queue over `store` with `config`.
    pub fn with_config(store: S, config: ReportingConfig) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "error_reports_total",
                "Total number of error reports by outcome (enqueued, delivered, rescheduled, dropped)"
            );
        }

        Self {
            store,
            config,
            io: Mutex::new(0),
            processing: AtomicBool::new(false),
        }
    }

    /// Persists `error` with the default attempt budget.
    pub fn enqueue(
        &self,
        error: SerializedError,
        priority: Priority,
    ) -> Result<ErrorId, ReportingError> {
        self.enqueue_with_max_attempts(error, priority, self.config.max_attempts)
    }

    /// Persists `error`, allowing at most `max_attempts` delivery attempts.
    ///
    /// The report is due immediately.
    pub fn enqueue_with_max_attempts(
        &self,
        error: SerializedError,
        priority: Priority,
        max_attempts: u32,
    ) -> Result<ErrorId, ReportingError> {
        let now = self.config.clock.now_millis();
        let mut events = Vec::new();

        let stored = {
            let mut next_id = self.io.lock();
            let mut entries = self.load(&mut events);
            let after_persisted = entries.iter().map(|e| e.id.0 + 1).max().unwrap_or(0);
            let id = ErrorId((*next_id).max(after_persisted));
            *next_id = id.0.saturating_add(1);
            entries.push(QueuedError {
                id,
                error,
                priority,
                attempts: 0,
                max_attempts: max_attempts.max(1),
                next_retry_at: now,
                created_at: now,
            });
            self.flush(&entries).map(|()| id)
        };

        if let Ok(id) = stored {
            #[cfg(feature = "metrics")]
            counter!("error_reports_total", "queue" => self.config.name.clone(), "outcome" => "enqueued")
                .increment(1);

            #[cfg(feature = "tracing")]
            debug!(queue = %self.config.name, error_id = id.get(), ?priority, "Error report queued");

            events.push(ReportEvent::Enqueued {
                pattern_name: self.config.name.clone(),
                timestamp: std::time::Instant::now(),
                error_id: id,
                priority,
            });
        }

        self.emit_all(events);
        stored
    }

    /// Attempts delivery of every due report through `processor`.
    ///
    /// Reports already out of attempts are removed without being sent.
    /// Reports whose retry time has not come are left as they are. Each
    /// outcome is persisted as soon as it is known, and applied to freshly
    /// loaded state so reports enqueued meanwhile are kept.
    ///
    /// Never fails: storage problems are logged and the affected outcome is
    /// retried on a later call. Only one call runs at a time; a concurrent
    /// call returns immediately with [`ProcessReport::skipped`] set.
    pub async fn process<Pr>(&self, processor: &Pr) -> ProcessReport
    where
        Pr: ErrorProcessor,
    {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return ProcessReport {
                skipped: true,
                ..ProcessReport::default()
            };
        }
        let _guard = ProcessingGuard(&self.processing);

        let mut report = ProcessReport::default();
        let batch = self.take_due(&mut report);

        for entry in batch {
            let outcome = processor.process(entry.error.clone()).await;
            self.settle(entry.id, outcome, &mut report);
        }

        report
    }

    /// Number of persisted reports.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` if no report is persisted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every persisted report, in storage order.
    pub fn entries(&self) -> Vec<QueuedError> {
        let mut events = Vec::new();
        let entries = {
            let _io = self.io.lock();
            self.load(&mut events)
        };
        self.emit_all(events);
        entries
    }

    /// Removes every persisted report.
    pub fn clear(&self) -> Result<(), ReportingError> {
        let _io = self.io.lock();
        self.store.remove(&self.config.storage_key)?;
        Ok(())
    }

    /// The configuration this queue was built with.
    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Drops exhausted entries and returns the due ones in delivery order.
    fn take_due(&self, report: &mut ProcessReport) -> Vec<QueuedError> {
        let now = self.config.clock.now_millis();
        let mut events = Vec::new();

        let due = {
            let _io = self.io.lock();
            let mut entries = self.load(&mut events);

            let before = entries.len();
            let mut exhausted = Vec::new();
            entries.retain(|e| {
                if e.is_exhausted() {
                    exhausted.push((e.id, e.attempts));
                    false
                } else {
                    true
                }
            });
            if entries.len() != before {
                self.flush_logged(&entries);
            }
            for (id, attempts) in exhausted {
                report.dropped += 1;
                events.push(self.record_dropped(id, attempts));
            }

            let mut due: Vec<QueuedError> =
                entries.iter().filter(|e| e.is_due(now)).cloned().collect();
            report.deferred = entries.len() - due.len();
            due.sort_by_key(|e| (e.priority.rank(), e.id));
            due
        };

        self.emit_all(events);
        due
    }

    fn settle<E>(&self, id: ErrorId, outcome: Result<(), E>, report: &mut ProcessReport)
    where
        E: std::fmt::Display,
    {
        let mut events = Vec::new();

        {
            let _io = self.io.lock();
            let mut entries = self.load(&mut events);
            // Missing if the queue was cleared while the processor ran.
            if let Some(index) = entries.iter().position(|e| e.id == id) {
                match outcome {
                    Ok(()) => {
                        entries.remove(index);
                        report.delivered += 1;
                        events.push(self.record_delivered(id));
                    }
                    Err(err) => {
                        let entry = &mut entries[index];
                        entry.attempts += 1;
                        let attempts = entry.attempts;

                        if entry.is_exhausted() {
                            entries.remove(index);
                            report.dropped += 1;
                            events.push(self.record_dropped(id, attempts));
                        } else {
                            let delay = self.config.backoff.next_interval(attempts);
                            let next_retry_at = self
                                .config
                                .clock
                                .now_millis()
                                .saturating_add(millis(delay));
                            entry.next_retry_at = next_retry_at;
                            report.rescheduled += 1;
                            events.push(self.record_rescheduled(id, attempts, next_retry_at, &err));
                        }
                    }
                }
                self.flush_logged(&entries);
            }
        }

        self.emit_all(events);
    }

    /// Reads the persisted entries. Unreadable state counts as empty.
    fn load(&self, events: &mut Vec<ReportEvent>) -> Vec<QueuedError> {
        let raw = match self.store.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                events.push(self.discard_state(OfflineError::PersistedState(err.to_string())));
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                events.push(self.discard_state(OfflineError::PersistedState(err.to_string())));
                Vec::new()
            }
        }
    }

    fn flush(&self, entries: &[QueuedError]) -> Result<(), ReportingError> {
        if entries.is_empty() {
            self.store.remove(&self.config.storage_key)?;
        } else {
            let json = serde_json::to_string(entries)?;
            self.store.set(&self.config.storage_key, &json)?;
        }
        Ok(())
    }

    fn flush_logged(&self, entries: &[QueuedError]) {
        if let Err(_err) = self.flush(entries) {
            #[cfg(feature = "tracing")]
            warn!(queue = %self.config.name, error = %_err, "Failed to persist error queue");
        }
    }

    fn discard_state(&self, err: OfflineError) -> ReportEvent {
        #[cfg(feature = "tracing")]
        warn!(queue = %self.config.name, error = %err, "Discarding unreadable error queue");

        ReportEvent::StateDiscarded {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            reason: err.to_string(),
        }
    }

    fn record_delivered(&self, id: ErrorId) -> ReportEvent {
        #[cfg(feature = "metrics")]
        counter!("error_reports_total", "queue" => self.config.name.clone(), "outcome" => "delivered")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(queue = %self.config.name, error_id = id.get(), "Error report delivered");

        ReportEvent::Delivered {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            error_id: id,
        }
    }

    fn record_rescheduled<E>(
        &self,
        id: ErrorId,
        attempts: u32,
        next_retry_at: u64,
        _err: &E,
    ) -> ReportEvent
    where
        E: std::fmt::Display,
    {
        #[cfg(feature = "metrics")]
        counter!("error_reports_total", "queue" => self.config.name.clone(), "outcome" => "rescheduled")
            .increment(1);

        #[cfg(feature = "tracing")]
        debug!(
            queue = %self.config.name,
            error_id = id.get(),
            attempts,
            next_retry_at,
            error = %_err,
            "Error report delivery failed, rescheduled"
        );

        ReportEvent::Rescheduled {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            error_id: id,
            attempts,
            next_retry_at,
        }
    }

    fn record_dropped(&self, id: ErrorId, attempts: u32) -> ReportEvent {
        #[cfg(feature = "metrics")]
        counter!("error_reports_total", "queue" => self.config.name.clone(), "outcome" => "dropped")
            .increment(1);

        #[cfg(feature = "tracing")]
        warn!(queue = %self.config.name, error_id = id.get(), attempts, "Error report dropped after final attempt");

        ReportEvent::Dropped {
            pattern_name: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            error_id: id,
            attempts,
        }
    }

    /// Emits outside the storage lock so listeners may call back into the queue.
    fn emit_all(&self, events: Vec<ReportEvent>) {
        for event in &events {
            self.config.event_listeners.emit(event);
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Clears the processing flag when `process` ends or its future is dropped.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
