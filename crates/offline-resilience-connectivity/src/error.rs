//! Error types for reachability probes.

use offline_resilience_core::{Classify, FailureKind};
use std::time::Duration;

/// Why a reachability probe failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The request never got an answer (DNS, refused, reset, ...).
    #[error("probe target unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered with a non-success status.
    #[error("probe returned status {0}")]
    Status(u16),

    /// No answer within the configured probe timeout.
    #[error("probe timed out after {0:?}")]
    TimedOut(Duration),

    /// The probe URL could not be built.
    #[error("invalid probe url: {0}")]
    InvalidUrl(String),
}

impl ProbeError {
    /// Shorthand for [`ProbeError::Unreachable`].
    pub fn unreachable(reason: impl Into<String>) -> Self {
        ProbeError::Unreachable(reason.into())
    }
}

impl Classify for ProbeError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            ProbeError::InvalidUrl(_) => FailureKind::Client,
            _ => FailureKind::Connectivity,
        }
    }
}
