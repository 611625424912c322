//! Error types for cache.

use std::fmt;

/// Errors returned by [`Cache::get_or_create`](crate::Cache::get_or_create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E> {
    /// The fetcher returned an error. Every caller waiting on the same
    /// fetch receives a clone of it.
    Fetch(E),

    /// The fetch task ended without producing a result (it panicked).
    FetchAborted,
}

impl<E: fmt::Display> fmt::Display for CacheError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Fetch(e) => write!(f, "fetch failed: {}", e),
            CacheError::FetchAborted => write!(f, "fetch ended without a result"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CacheError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Fetch(e) => Some(e),
            CacheError::FetchAborted => None,
        }
    }
}

impl<E> CacheError<E> {
    /// Returns the fetcher's error, if there was one.
    pub fn into_fetch_error(self) -> Option<E> {
        match self {
            CacheError::Fetch(e) => Some(e),
            CacheError::FetchAborted => None,
        }
    }
}
