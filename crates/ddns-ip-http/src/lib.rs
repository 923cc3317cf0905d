// # HTTP IP Source
//
// This crate provides the HTTP-based external IP resolver for the DDNS
// system.
//
// ## Purpose
//
// Behind NAT the host's interfaces do not carry the public address, so the
// address the outside world sees is asked of an echo service that answers
// with the caller's IPv4 address as plain text (e.g. icanhazip.com).
//
// ## Behavior
//
// - One GET per call, no caching and no retries
// - The body is trimmed and parsed as an IPv4 address
// - Transport failures, non-2xx statuses and unparseable bodies all map
//   to `Error::Network`

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// HTTP-based external IP source
pub struct HttpIpSource {
    /// URL of the echo service
    url: String,

    /// HTTP client (carries the per-request timeout)
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Echo service URL (e.g., "https://ipv4.icanhazip.com")
    /// - `timeout`: Per-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from the `ip_source` section of the configuration
    pub fn from_config(config: &IpSourceConfig, timeout: Duration) -> Result<Self> {
        config.validate()?;
        Self::new(config.url.clone(), timeout)
    }

    /// Fetch the current IP from the echo service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        tracing::debug!("GET {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("IP echo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(format!(
                "IP echo service returned HTTP {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read IP echo response: {}", e)))?;

        parse_ipv4(&body)
    }
}

/// Parse an echo service body into an IPv4 address
fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse::<Ipv4Addr>()
        .map_err(|_| Error::network(format!("IP echo service returned an invalid IPv4 address: {:?}", text)))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        self.fetch_ip().await
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}
