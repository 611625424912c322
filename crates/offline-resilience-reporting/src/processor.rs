//! Delivery of queued error reports.

use crate::entry::SerializedError;
use std::fmt;
use std::future::Future;

/// Sends one error report to the collecting backend.
///
/// Any `Err` counts as a failed attempt and reschedules the report with
/// backoff until its attempt budget is spent.
///
/// Using a closure (via blanket impl):
///
/// ```rust
/// use offline_resilience_reporting::{ErrorProcessor, SerializedError};
///
/// let processor = |report: SerializedError| async move {
///     println!("reporting {}", report);
///     Ok::<(), String>(())
/// };
/// ```
pub trait ErrorProcessor: Send + Sync {
    type Error: fmt::Display + Send;

    fn process(&self, report: SerializedError)
        -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<F, Fut, E> ErrorProcessor for F
where
    F: Fn(SerializedError) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: fmt::Display + Send,
{
    type Error = E;

    fn process(
        &self,
        report: SerializedError,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self(report)
    }
}
