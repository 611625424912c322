//! Reachability probe trait.

use crate::ProbeError;
use std::future::Future;

/// An active reachability check.
///
/// The monitor measures the round-trip around [`Probe::probe`] itself, so an
/// implementation only has to report whether the endpoint answered.
///
/// # Examples
///
/// Using a closure (via blanket impl):
///
/// ```rust
/// use offline_resilience_connectivity::{Probe, ProbeError};
///
/// let probe = || async { Ok::<(), ProbeError>(()) };
/// ```
///
/// Implementing the trait:
///
/// ```rust
/// use offline_resilience_connectivity::{Probe, ProbeError};
/// use std::net::SocketAddr;
///
/// struct TcpProbe {
///     addr: SocketAddr,
/// }
///
/// impl Probe for TcpProbe {
///     async fn probe(&self) -> Result<(), ProbeError> {
///         tokio::net::TcpStream::connect(self.addr)
///             .await
///             .map(|_| ())
///             .map_err(|e| ProbeError::unreachable(e.to_string()))
///     }
/// }
/// ```
pub trait Probe: Send + Sync {
    /// Performs one reachability check.
    fn probe(&self) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

impl<F, Fut> Probe for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), ProbeError>> + Send,
{
    fn probe(&self) -> impl Future<Output = Result<(), ProbeError>> + Send {
        self()
    }
}
