//! Persisted error records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a queued error report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(pub(crate) u64);

impl ErrorId {
    /// The raw numeric id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivery priority. Critical reports are sent before normal ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    #[default]
    Normal,
}

impl Priority {
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::Normal => 1,
        }
    }
}

/// Transport-safe snapshot of an error.
///
/// ```rust
/// use offline_resilience_reporting::SerializedError;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
/// let report = SerializedError::from_error(&err).with_code("E_DISK");
///
/// assert_eq!(report.message, "disk full");
/// assert_eq!(report.code.as_deref(), Some("E_DISK"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl SerializedError {
    /// A report with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            name: None,
            stack: None,
            code: None,
        }
    }

    /// Captures `err`'s message, its type name, and its `source()` chain.
    ///
    /// Each source becomes one `caused by:` line of `stack`.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            name: Some(std::any::type_name::<E>().to_string()),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
            code: None,
        }
    }

    /// Sets the error type name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the captured stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Sets an application error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl fmt::Display for SerializedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A report waiting for delivery, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedError {
    pub id: ErrorId,
    pub error: SerializedError,
    pub priority: Priority,
    /// Failed delivery attempts so far.
    pub attempts: u32,
    pub max_attempts: u32,
    /// Unix millis before which the report is not attempted.
    pub next_retry_at: u64,
    /// Unix millis of enqueue.
    #[serde(default)]
    pub created_at: u64,
}

impl QueuedError {
    /// `true` once no further attempt is allowed.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// `true` if the report may be attempted at `now_millis`.
    pub fn is_due(&self, now_millis: u64) -> bool {
        self.next_retry_at <= now_millis
    }
}
