// # DNSPod DNS Provider
//
// This crate provides a DNSPod (dnsapi.cn) provider implementation for the
// DDNS system.
//
// ## Behavior
//
// - ✅ One form-encoded POST per trait call
// - ✅ Login token authentication ("ID,Token")
// - ✅ TTL and record line preserved across updates
// - ❌ NO retry logic
// - ❌ NO record creation
//
// ## Security Requirements
//
// - The login token NEVER appears in logs; it travels only in the POST body
//
// ## API Reference
//
// Every response carries `status.code`; "1" means success.
//
// - Domain.List: list domains of the account
// - Record.List: list records of a domain, filtered by sub_domain
// - Record.Modify: overwrite a record by record_id

mod types;

use async_trait::async_trait;
use ddns_core::config::{ProviderConfig, RecordTarget};
use ddns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, Zone};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{DnspodRecord, DomainListResponse, RecordListResponse, StatusOnly};

/// DNSPod API base URL
pub const DNSPOD_API_BASE: &str = "https://dnsapi.cn";

/// Line used when the record did not report one
const DEFAULT_RECORD_LINE: &str = "默认";

/// Status code for success
const STATUS_OK: &str = "1";

/// Status code for "record already exists"
const STATUS_RECORD_EXISTS: &str = "104";

/// Status codes meaning the domain or record does not exist
const NOT_FOUND_STATUSES: &[&str] = &["6", "8", "10"];

const PROVIDER: &str = "dnspod";

/// DNSPod requires an identifying User-Agent
const USER_AGENT: &str = concat!("ddns/", env!("CARGO_PKG_VERSION"), " (https://github.com/ddns-lab/ddns)");

/// DNSPod DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the login token.
pub struct DnspodProvider {
    /// "ID,Token"
    /// ⚠️ NEVER log this value
    login_token: String,

    base_url: String,

    client: reqwest::Client,
}

impl std::fmt::Debug for DnspodProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnspodProvider")
            .field("login_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DnspodProvider {
    /// Create a new DNSPod provider
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is not of the form "ID,Token".
    pub fn new(login_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let login_token = login_token.into();
        match login_token.split_once(',') {
            Some((id, token)) if !id.trim().is_empty() && !token.trim().is_empty() => {}
            _ => {
                return Err(Error::config(
                    "DNSPod login_token must have the form 'ID,Token'",
                ));
            }
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            login_token,
            base_url: DNSPOD_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Call an action with the given form fields
    ///
    /// `duplicate_value` is the value being written, when the call is an
    /// update; the "record already exists" status is then reported as
    /// `Error::DuplicateValue`.
    async fn call<T: DeserializeOwned>(
        &self,
        action: &str,
        fields: &[(&str, &str)],
        duplicate_value: Option<&str>,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, action);
        let mut form: Vec<(&str, &str)> = vec![
            ("login_token", self.login_token.as_str()),
            ("format", "json"),
        ];
        form.extend_from_slice(fields);

        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::network(format!("DNSPod {} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read DNSPod response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::provider_status(
                PROVIDER,
                status.as_u16(),
                format!("{} failed: {}", action, body.trim()),
            ));
        }

        let StatusOnly { status: api_status } = serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", action, e))
        })?;

        if api_status.code != STATUS_OK {
            tracing::debug!(
                "DNSPod API error: {} - {}",
                api_status.code,
                api_status.message
            );
            return Err(map_status(
                action,
                &api_status.code,
                &api_status.message,
                duplicate_value,
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", action, e))
        })
    }
}

/// Map a non-success status code to an error variant
fn map_status(action: &str, code: &str, message: &str, duplicate_value: Option<&str>) -> Error {
    match (code, duplicate_value) {
        (STATUS_RECORD_EXISTS, Some(value)) => Error::duplicate_value(PROVIDER, value),
        _ if NOT_FOUND_STATUSES.contains(&code) => {
            Error::not_found(format!("DNSPod {}: {} (code {})", action, message, code))
        }
        _ => Error::provider(
            PROVIDER,
            format!("{} failed: {} (code {})", action, message, code),
        ),
    }
}

fn to_record(record: DnspodRecord) -> DnsRecord {
    DnsRecord {
        id: record.id,
        name: record.name,
        record_type: record.record_type,
        value: record.value,
        ttl: record.ttl.and_then(|ttl| ttl.parse().ok()),
        extra: serde_json::json!({ "line": record.line }),
    }
}

#[async_trait]
impl DnsProvider for DnspodProvider {
    async fn resolve_zone(&self, domain_name: &str) -> Result<Zone> {
        let response: DomainListResponse = self.call("Domain.List", &[], None).await?;

        response
            .domains
            .into_iter()
            .find(|d| d.name == domain_name)
            .map(|d| Zone::new(d.id, d.name))
            .ok_or_else(|| Error::not_found(format!("Domain not found: {}", domain_name)))
    }

    async fn find_record(&self, zone: &Zone, target: &RecordTarget) -> Result<DnsRecord> {
        let label = target.label();
        let response: RecordListResponse = self
            .call(
                "Record.List",
                &[
                    ("domain_id", zone.id.as_str()),
                    ("sub_domain", label.as_str()),
                    ("record_type", target.record_type.as_str()),
                ],
                None,
            )
            .await?;

        response
            .records
            .into_iter()
            .find(|r| r.name == label && r.record_type == target.record_type)
            .map(to_record)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "DNS record not found: {} in {} (type: {})",
                    label, zone.name, target.record_type
                ))
            })
    }

    async fn update_record(&self, zone: &Zone, record: &DnsRecord, new_value: &str) -> Result<()> {
        let line = record.extra["line"].as_str().unwrap_or(DEFAULT_RECORD_LINE);
        let ttl = record.ttl.map(|ttl| ttl.to_string());

        let mut fields = vec![
            ("domain_id", zone.id.as_str()),
            ("record_id", record.id.as_str()),
            ("sub_domain", record.name.as_str()),
            ("record_type", record.record_type.as_str()),
            ("record_line", line),
            ("value", new_value),
        ];
        if let Some(ttl) = ttl.as_deref() {
            fields.push(("ttl", ttl));
        }

        let _: StatusOnly = self
            .call("Record.Modify", &fields, Some(new_value))
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating DNSPod providers
pub struct DnspodFactory;

impl DnsProviderFactory for DnspodFactory {
    fn create(&self, config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Dnspod { login_token } => {
                Ok(Box::new(DnspodProvider::new(login_token.clone(), timeout)?))
            }
            _ => Err(Error::config("Invalid config for DNSPod provider")),
        }
    }
}

/// Register the DNSPod provider with a registry
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(DnspodFactory));
}
