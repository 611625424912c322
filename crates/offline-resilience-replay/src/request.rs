//! Queued mutation types.

use crate::error::ParseMethodError;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifier of a queued mutation. Stable across replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub(crate) u64);

impl RequestId {
    /// The raw numeric id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// HTTP method of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Patch,
            Method::Delete,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

/// How a mutation is queued.
///
/// ```rust
/// use offline_resilience_replay::{Method, RequestOptions};
///
/// let options = RequestOptions::new(Method::Put).priority(10);
/// assert_eq!(options.method(), Method::Put);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub(crate) method: Method,
    pub(crate) priority: i32,
    pub(crate) dependencies: HashSet<RequestId>,
}

impl RequestOptions {
    /// Options for `method` with priority 0 and no dependencies.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            priority: 0,
            dependencies: HashSet::new(),
        }
    }

    /// Higher priorities replay first.
    ///
    /// Default: 0
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Holds this mutation back while `id` is still queued.
    pub fn depends_on(mut self, id: RequestId) -> Self {
        self.dependencies.insert(id);
        self
    }

    /// Adds several dependencies at once.
    pub fn depends_on_all(mut self, ids: impl IntoIterator<Item = RequestId>) -> Self {
        self.dependencies.extend(ids);
        self
    }

    /// The HTTP method these options were created for.
    pub fn method(&self) -> Method {
        self.method
    }
}

/// A mutation waiting to be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRequest<P> {
    pub(crate) id: RequestId,
    pub(crate) endpoint: String,
    pub(crate) method: Method,
    pub(crate) priority: i32,
    pub(crate) dependencies: HashSet<RequestId>,
    pub(crate) payload: P,
}

impl<P> QueuedRequest<P> {
    /// Id assigned at first enqueue; kept across replacements.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Target endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Higher values are replayed first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Ids that must leave the queue before this request is attempted.
    pub fn dependencies(&self) -> &HashSet<RequestId> {
        &self.dependencies
    }

    /// Latest payload enqueued for this endpoint and method.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the request and returns its payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}
