//! Failure taxonomy shared by the offline-resilience components.
//!
//! Every failure that crosses a component boundary falls into one of four
//! classes, and each class has a fixed consequence:
//!
//! | Kind | Consequence |
//! |---|---|
//! | [`FailureKind::Connectivity`] | mutation replay halts, the item stays queued |
//! | [`FailureKind::Client`] | the mutation can never succeed as-is and is dropped |
//! | [`FailureKind::TransientBackend`] | error reports are rescheduled with backoff |
//! | [`FailureKind::PersistedState`] | the durable blob is discarded and the queue starts empty |
//!
//! Executors report the class of their own errors by implementing
//! [`Classify`]:
//!
//! ```rust
//! use offline_resilience_core::{Classify, FailureKind};
//!
//! #[derive(Debug)]
//! enum ApiError {
//!     Unreachable,
//!     Status(u16),
//! }
//!
//! impl Classify for ApiError {
//!     fn failure_kind(&self) -> FailureKind {
//!         match self {
//!             ApiError::Unreachable => FailureKind::Connectivity,
//!             ApiError::Status(code) if *code >= 500 => FailureKind::TransientBackend,
//!             ApiError::Status(_) => FailureKind::Client,
//!         }
//!     }
//! }
//!
//! assert!(ApiError::Unreachable.failure_kind().is_connectivity());
//! assert_eq!(ApiError::Status(422).failure_kind(), FailureKind::Client);
//! ```

use std::io;

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The network or the remote host could not be reached.
    Connectivity,
    /// The request was rejected and will never succeed unchanged.
    Client,
    /// The backend failed in a way that is worth retrying later.
    TransientBackend,
    /// Durable state could not be read back.
    PersistedState,
}

impl FailureKind {
    /// Returns `true` for connectivity-class failures.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, FailureKind::Connectivity)
    }

    /// Returns `true` if a later attempt may succeed without changing the request.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            FailureKind::Connectivity | FailureKind::TransientBackend
        )
    }
}

/// Errors that know which [`FailureKind`] they belong to.
pub trait Classify {
    /// Returns the failure class of this error.
    fn failure_kind(&self) -> FailureKind;
}

/// A ready-made error type covering the whole taxonomy.
///
/// Useful for executors and processors that do not have a richer error type
/// of their own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfflineError {
    /// Probe or network failure.
    #[error("connectivity failure: {0}")]
    Connectivity(String),

    /// Non-retriable rejection such as a validation error.
    #[error("request rejected: {0}")]
    Client(String),

    /// Retriable backend failure.
    #[error("transient backend failure: {0}")]
    TransientBackend(String),

    /// Corrupt or unparseable durable state.
    #[error("persisted state unreadable: {0}")]
    PersistedState(String),
}

impl OfflineError {
    /// Shorthand for [`OfflineError::Connectivity`].
    pub fn connectivity(msg: impl Into<String>) -> Self {
        OfflineError::Connectivity(msg.into())
    }

    /// Shorthand for [`OfflineError::Client`].
    pub fn client(msg: impl Into<String>) -> Self {
        OfflineError::Client(msg.into())
    }

    /// Shorthand for [`OfflineError::TransientBackend`].
    pub fn transient(msg: impl Into<String>) -> Self {
        OfflineError::TransientBackend(msg.into())
    }
}

impl Classify for OfflineError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            OfflineError::Connectivity(_) => FailureKind::Connectivity,
            OfflineError::Client(_) => FailureKind::Client,
            OfflineError::TransientBackend(_) => FailureKind::TransientBackend,
            OfflineError::PersistedState(_) => FailureKind::PersistedState,
        }
    }
}

impl Classify for io::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::UnexpectedEof => FailureKind::Connectivity,
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => {
                FailureKind::TransientBackend
            }
            _ => FailureKind::Client,
        }
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn failure_kind(&self) -> FailureKind {
        (**self).failure_kind()
    }
}
