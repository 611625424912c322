//! Draining queues when connectivity returns.
//!
//! Each helper spawns a task that watches a [`ConnectivityMonitor`] and runs
//! an action on every observed transition from offline to online. Only a
//! probed state counts as online: the state a monitor assumes from the host
//! flag before its first evaluation is treated as offline, so a host that
//! starts online waits for the first successful probe. Transitions between
//! strong and weak do not count, and a flap the task never observes collapses
//! into no change.
//! Abort the returned handle to stop watching; the task also ends when the
//! monitor is dropped.

use offline_resilience_connectivity::{ConnectivityMonitor, Probe};
use std::future::Future;
use tokio::task::JoinHandle;

#[cfg(feature = "replay")]
use offline_resilience_replay::{Executor, MutationQueue};
#[cfg(feature = "reporting")]
use offline_resilience_reporting::{DurableStore, ErrorProcessor, ErrorReportQueue};
#[cfg(any(feature = "replay", feature = "reporting"))]
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Runs `action` whenever `monitor` goes from offline to online.
pub fn on_reconnect<P, F, Fut>(monitor: &ConnectivityMonitor<P>, mut action: F) -> JoinHandle<()>
where
    P: Probe + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    // Subscribe before reading the snapshot so an evaluation racing this
    // call is still observed through the channel.
    let mut states = monitor.watch();
    let verified_online = monitor.is_verified() && monitor.state().is_online();

    tokio::spawn(async move {
        let mut was_online = verified_online;
        if was_online {
            action().await;
        }

        while states.changed().await.is_ok() {
            let online = states.borrow_and_update().is_online();
            if online && !was_online {
                action().await;
            }
            was_online = online;
        }
    })
}

/// Replays `queue` whenever `monitor` goes from offline to online.
#[cfg(feature = "replay")]
pub fn replay_on_reconnect<Pr, P, X>(
    monitor: &ConnectivityMonitor<Pr>,
    queue: Arc<MutationQueue<P, X>>,
) -> JoinHandle<()>
where
    Pr: Probe + 'static,
    P: Clone + Send + Sync + 'static,
    X: Executor<P> + 'static,
{
    on_reconnect(monitor, move || {
        let queue = Arc::clone(&queue);
        async move {
            let _report = queue.process().await;

            #[cfg(feature = "tracing")]
            debug!(
                executed = _report.executed,
                dropped = _report.dropped,
                remaining = _report.remaining,
                "Replayed mutations after reconnect"
            );
        }
    })
}

/// Delivers due error reports whenever `monitor` goes from offline to online.
#[cfg(feature = "reporting")]
pub fn report_on_reconnect<Pr, S, E>(
    monitor: &ConnectivityMonitor<Pr>,
    queue: Arc<ErrorReportQueue<S>>,
    processor: Arc<E>,
) -> JoinHandle<()>
where
    Pr: Probe + 'static,
    S: DurableStore + 'static,
    E: ErrorProcessor + 'static,
{
    on_reconnect(monitor, move || {
        let queue = Arc::clone(&queue);
        let processor = Arc::clone(&processor);
        async move {
            let _report = queue.process(processor.as_ref()).await;

            #[cfg(feature = "tracing")]
            debug!(
                delivered = _report.delivered,
                rescheduled = _report.rescheduled,
                "Delivered error reports after reconnect"
            );
        }
    })
}
