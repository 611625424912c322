//! Error types for replay.

/// Returned when parsing a [`Method`](crate::Method) from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HTTP method: {0}")]
pub struct ParseMethodError(pub(crate) String);

impl ParseMethodError {
    /// The text that failed to parse.
    pub fn input(&self) -> &str {
        &self.0
    }
}
