// # HTTP Public IP Source
//
// This crate provides an HTTP-based public IP source for ddsync.
//
// ## Architecture
//
// Sends one GET to a "what is my IP" endpoint (e.g. https://domains.google.com/checkip,
// https://api.ipify.org) per fetch. The body must be a bare IPv4 address;
// surrounding whitespace and framing characters are stripped before the
// address is strictly parsed.
//
// No caching and no retry: the sync engine decides when to ask again.

use ddsync_core::address::parse_ipv4;
use ddsync_core::traits::PublicIpSource;
use ddsync_core::{Error, Result, SyncConfig};

use std::net::Ipv4Addr;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP-based public IP source
pub struct HttpPublicIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpPublicIpSource {
    /// Create a new HTTP public IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the address from (e.g., "https://api.ipify.org")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the `publicIpUrl` setting
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(config.public_ip_url.clone())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl PublicIpSource for HttpPublicIpSource {
    async fn fetch(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::network(format!(
                "{} answered with HTTP {}",
                self.url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip = parse_ipv4(&body)?;
        debug!("Public IP from {}: {}", self.url, ip);

        Ok(ip)
    }

    fn describe(&self) -> String {
        format!("http({})", self.url)
    }
}

impl std::fmt::Debug for HttpPublicIpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPublicIpSource")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
