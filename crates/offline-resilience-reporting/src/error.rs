//! Error types for error reporting.

use std::io;

/// Failure of a [`DurableStore`](crate::DurableStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The store refused the write, for example because it is full.
    #[error("storage rejected write: {0}")]
    Rejected(String),
}

/// Errors returned by [`ErrorReportQueue`](crate::ErrorReportQueue).
#[derive(Debug, thiserror::Error)]
pub enum ReportingError {
    /// Durable storage failed.
    #[error("failed to persist error queue: {0}")]
    Store(#[from] StoreError),

    /// The queue could not be encoded as JSON.
    #[error("failed to encode error queue: {0}")]
    Encode(#[from] serde_json::Error),
}
