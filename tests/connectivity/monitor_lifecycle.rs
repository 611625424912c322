//! Monitor behavior driven by a scripted probe.

use offline_resilience_connectivity::{
    ConnectivityConfig, ConnectivityMonitor, ConnectivityState, ProbeError,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Probe whose outcome is flipped by the test and which counts its calls.
#[derive(Clone, Default)]
struct Scripted {
    down: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn probe(
        &self,
    ) -> impl Fn() -> std::future::Ready<Result<(), ProbeError>> + Send + Sync + 'static {
        let down = Arc::clone(&self.down);
        let calls = Arc::clone(&self.calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if down.load(Ordering::SeqCst) {
                std::future::ready(Err(ProbeError::Status(503)))
            } else {
                std::future::ready(Ok(()))
            }
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test(start_paused = true)]
async fn host_offline_signal_skips_the_probe() {
    let script = Scripted::default();
    let monitor = ConnectivityMonitor::new(script.probe(), ConnectivityConfig::default());

    assert_eq!(monitor.host_signal(false).await, ConnectivityState::Offline);
    assert_eq!(script.calls(), 0);
    assert!(!monitor.is_host_online());

    // A probe while the host reports offline cannot bring the state back.
    assert_eq!(monitor.check_now().await, ConnectivityState::Offline);
}

#[tokio::test(start_paused = true)]
async fn host_online_signal_is_verified_by_a_probe() {
    let script = Scripted::default();
    let monitor = ConnectivityMonitor::new(
        script.probe(),
        ConnectivityConfig::builder()
            .initial_host_online(false)
            .build(),
    );
    assert_eq!(monitor.state(), ConnectivityState::Offline);

    script.down.store(true, Ordering::SeqCst);
    assert_eq!(monitor.host_signal(true).await, ConnectivityState::Offline);
    assert_eq!(script.calls(), 1);

    script.down.store(false, Ordering::SeqCst);
    assert_eq!(monitor.check_now().await, ConnectivityState::Strong);
}

#[tokio::test(start_paused = true)]
async fn listeners_see_each_transition_once() {
    let script = Scripted::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let transitions = Arc::new(Mutex::new(Vec::new()));

    let t = Arc::clone(&transitions);
    let monitor = ConnectivityMonitor::new(
        script.probe(),
        ConnectivityConfig::builder()
            .on_state_change(move |from, to| t.lock().push((from, to)))
            .build(),
    );
    let s = Arc::clone(&seen);
    let _subscription = monitor.on_change(move |state| s.lock().push(state));

    monitor.check_now().await;
    script.down.store(true, Ordering::SeqCst);
    monitor.check_now().await;
    monitor.check_now().await;
    script.down.store(false, Ordering::SeqCst);
    monitor.check_now().await;

    assert_eq!(
        *seen.lock(),
        vec![ConnectivityState::Offline, ConnectivityState::Strong]
    );
    assert_eq!(
        *transitions.lock(),
        vec![
            (ConnectivityState::Strong, ConnectivityState::Offline),
            (ConnectivityState::Offline, ConnectivityState::Strong),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unsubscribed_listener_is_not_called() {
    let script = Scripted::default();
    let monitor = ConnectivityMonitor::new(script.probe(), ConnectivityConfig::default());
    let count = Arc::new(AtomicUsize::new(0));

    let c = Arc::clone(&count);
    let subscription = monitor.on_change(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    assert!(subscription.unsubscribe());

    monitor.host_signal(false).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_detects_an_outage() {
    let script = Scripted::default();
    let monitor = ConnectivityMonitor::new(
        script.probe(),
        ConnectivityConfig::builder()
            .heartbeat_interval(Duration::from_secs(10))
            .build(),
    );
    let mut states = monitor.watch();

    monitor.start();
    assert!(monitor.is_running());
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(script.calls(), 1);
    // The first probe confirms the assumed state.
    assert_eq!(*states.borrow_and_update(), ConnectivityState::Strong);

    script.down.store(true, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(11), states.changed())
        .await
        .expect("heartbeat should observe the outage")
        .unwrap();
    assert_eq!(*states.borrow(), ConnectivityState::Offline);

    monitor.stop();
    assert!(!monitor.is_running());
    let calls = script.calls();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(script.calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn zero_heartbeat_interval_still_starts() {
    let script = Scripted::default();
    let monitor = ConnectivityMonitor::new(
        script.probe(),
        ConnectivityConfig::builder()
            .heartbeat_interval(Duration::ZERO)
            .build(),
    );

    monitor.start();
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert!(monitor.is_running());
    assert!(script.calls() >= 1);
    monitor.stop();
}
