//! Offline mutation replay.
//!
//! [`MutationQueue`] holds writes the application could not send while
//! offline and replays them through an injected [`Executor`] once
//! connectivity returns.
//!
//! - Later writes to the same endpoint and method replace earlier ones, so
//!   only the newest intent is sent.
//! - Higher priorities go first; equal priorities keep their enqueue order.
//! - A mutation can depend on others and waits until they leave the queue.
//! - A connectivity failure stops the drain with everything still queued;
//!   any other failure drops the offending mutation and moves on.
//!
//! Any [`tower::Service`] over [`QueuedRequest`] can serve as executor via
//! [`ServiceExecutor`].

mod config;
mod error;
mod events;
mod executor;
mod queue;
mod request;

pub use config::{ReplayConfig, ReplayConfigBuilder};
pub use error::ParseMethodError;
pub use events::ReplayEvent;
pub use executor::{Executor, ServiceExecutor};
pub use queue::{DrainReport, MutationQueue};
pub use request::{Method, QueuedRequest, RequestId, RequestOptions};
