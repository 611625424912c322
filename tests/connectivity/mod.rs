//! Connectivity monitor tests.
//!
//! Test organization:
//! - http_probe.rs: the HTTP probe against a mock server
//! - monitor_lifecycle.rs: heartbeat, host signal and subscriptions

mod monitor_lifecycle;
