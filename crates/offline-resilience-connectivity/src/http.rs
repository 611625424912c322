//! HTTP reachability probe.

use crate::{Probe, ProbeError};
use offline_resilience_core::{Clock, SystemClock};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Url};

/// Health path probed when none is given.
pub const DEFAULT_HEALTH_PATH: &str = "/api/health";

/// Probes a health endpoint with a body-less `HEAD` request.
///
/// Every request carries a fresh `t=<unix millis>` query parameter and
/// `no-store` headers so no cache between client and server can answer on
/// the server's behalf. Any 2xx answer is success; any other status or a
/// transport error is failure.
///
/// ```rust,no_run
/// use offline_resilience_connectivity::{ConnectivityConfig, ConnectivityMonitor, HttpProbe};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let probe = HttpProbe::new("https://app.example.com")?;
/// let monitor = ConnectivityMonitor::new(probe, ConnectivityConfig::default());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: Url,
}

impl HttpProbe {
    /// Probes [`DEFAULT_HEALTH_PATH`] on `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ProbeError> {
        Self::with_path(base_url, DEFAULT_HEALTH_PATH)
    }

    /// Probes `path` on `base_url`.
    pub fn with_path(base_url: &str, path: &str) -> Result<Self, ProbeError> {
        let url = Url::parse(base_url)
            .and_then(|base| base.join(path))
            .map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;
        Ok(Self::with_client(Client::new(), url))
    }

    /// Probes `url` using an existing client (proxy settings, TLS roots, ...).
    pub fn with_client(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    /// The probed URL, without the cache-busting parameter.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn cache_busted_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("t", &SystemClock.now_millis().to_string());
        url
    }
}

impl Probe for HttpProbe {
    async fn probe(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .head(self.cache_busted_url())
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| ProbeError::unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}
