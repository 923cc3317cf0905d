// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for the DDNS system.
//
// ## Behavior
//
// - ✅ One HTTP request per trait call (zone list, record list, or PUT)
// - ✅ Full error propagation to the reconciler
// - ✅ Per-request HTTP timeout from configuration
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ TTL and proxied flag preserved across updates
// - ❌ NO retry logic (a failed run is re-run by the external scheduler)
// - ❌ NO record creation (a missing record is an error)
// - ❌ NO caching
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Implement retry logic
// - ❌ Decide whether an update is needed (owned by Reconciler)
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

mod types;

use async_trait::async_trait;
use ddns_core::config::{ProviderConfig, RecordTarget};
use ddns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, Zone};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{
    CloudflareDnsRecord, CloudflareError, CloudflareErrorEnvelope, CloudflareResponse,
    CloudflareZone, UpdateDnsRecordRequest,
};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// TTL value meaning "automatic"
const AUTO_TTL: u32 = 1;

/// Error codes reporting that the submitted record is already stored
///
/// - 81057: The record already exists
/// - 81058: A record with those settings already exists
const DUPLICATE_RECORD_CODES: &[i64] = &[81057, 81058];

const PROVIDER: &str = "cloudflare";

/// Cloudflare DNS provider
///
/// # Trust Level: Untrusted
///
/// This provider is isolated, stateless, and single-shot.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `timeout`: Per-request HTTP timeout
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(api_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request and unwrap the response envelope
    ///
    /// `duplicate_value` is the value being written, when the request is an
    /// update; a duplicate-record error code is then reported as
    /// `Error::DuplicateValue`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
        duplicate_value: Option<&str>,
    ) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::network(format!("Cloudflare {} request failed: {}", context, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read Cloudflare response: {}", e)))?;

        if !status.is_success() {
            let errors = serde_json::from_str::<CloudflareErrorEnvelope>(&body)
                .map(|envelope| envelope.errors)
                .unwrap_or_default();
            return Err(map_failure(status, &errors, &body, context, duplicate_value));
        }

        let envelope: CloudflareResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", context, e))
        })?;

        if !envelope.success {
            return Err(map_failure(status, &envelope.errors, &body, context, duplicate_value));
        }

        envelope.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("Invalid {} response: missing result", context))
        })
    }
}

/// Map a failed API call to an error variant
fn map_failure(
    status: StatusCode,
    errors: &[CloudflareError],
    body: &str,
    context: &str,
    duplicate_value: Option<&str>,
) -> Error {
    if let Some(value) = duplicate_value {
        if errors.iter().any(|e| DUPLICATE_RECORD_CODES.contains(&e.code)) {
            return Error::duplicate_value(PROVIDER, value);
        }
    }

    let detail = match errors.first() {
        Some(e) => format!("{} (code {})", e.message, e.code),
        None => body.trim().to_string(),
    };

    match status.as_u16() {
        401 | 403 => Error::provider_status(
            PROVIDER,
            status.as_u16(),
            format!(
                "Authentication failed: invalid API token or insufficient permissions ({})",
                detail
            ),
        ),
        // An update names a record that was just read; a 404 there is a rejection
        404 if duplicate_value.is_none() => {
            Error::not_found(format!("Cloudflare {}: {}", context, detail))
        }
        429 => Error::provider_status(
            PROVIDER,
            status.as_u16(),
            "Rate limit exceeded. Please retry later",
        ),
        500..=599 => Error::provider_status(
            PROVIDER,
            status.as_u16(),
            format!("Cloudflare server error (transient): {}", detail),
        ),
        _ => Error::provider_status(
            PROVIDER,
            status.as_u16(),
            format!("{} failed: {}", context, detail),
        ),
    }
}

fn to_record(record: CloudflareDnsRecord) -> DnsRecord {
    DnsRecord {
        id: record.id,
        name: record.name,
        record_type: record.record_type,
        value: record.content,
        ttl: record.ttl,
        extra: serde_json::json!({ "proxied": record.proxied.unwrap_or(false) }),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn resolve_zone(&self, domain_name: &str) -> Result<Zone> {
        tracing::debug!("Looking up Cloudflare zone for domain: {}", domain_name);

        let url = format!("{}/zones", self.base_url);
        let request = self.client.get(&url).query(&[("name", domain_name)]);
        let zones: Vec<CloudflareZone> = self.send(request, "zone lookup", None).await?;

        let zone = zones
            .into_iter()
            .find(|z| z.name == domain_name)
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", domain_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(Zone::new(zone.id, zone.name))
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record(&self, zone: &Zone, target: &RecordTarget) -> Result<DnsRecord> {
        let fqdn = target.fqdn();
        tracing::debug!(
            "Looking up record: {} (type: {})",
            fqdn,
            target.record_type
        );

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone.id);
        let request = self.client.get(&url).query(&[
            ("name", fqdn.as_str()),
            ("type", target.record_type.as_str()),
        ]);
        let records: Vec<CloudflareDnsRecord> = self.send(request, "record lookup", None).await?;

        records
            .into_iter()
            .find(|r| r.name == fqdn && r.record_type == target.record_type)
            .map(to_record)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "DNS record not found: {} (type: {})",
                    fqdn, target.record_type
                ))
            })
    }

    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "5.6.7.8",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(&self, zone: &Zone, record: &DnsRecord, new_value: &str) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone.id, record.id
        );
        let payload = UpdateDnsRecordRequest {
            record_type: &record.record_type,
            name: &record.name,
            content: new_value,
            ttl: record.ttl.unwrap_or(AUTO_TTL),
            proxied: record.extra["proxied"].as_bool().unwrap_or(false),
        };

        tracing::debug!("PUT {}", url);
        let request = self.client.put(&url).json(&payload);
        let _: CloudflareDnsRecord = self.send(request, "record update", Some(new_value)).await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare { api_token } => {
                Ok(Box::new(CloudflareProvider::new(api_token.clone(), timeout)?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// ddns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
