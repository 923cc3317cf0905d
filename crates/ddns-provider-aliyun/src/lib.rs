// # Aliyun DNS Provider
//
// This crate provides an Aliyun (Alibaba Cloud) DNS provider implementation
// for the DDNS system.
//
// ## Behavior
//
// - ✅ One signed RPC call per trait call
// - ✅ ACS3-HMAC-SHA256 request signing (AccessKey ID / secret)
// - ✅ TTL and resolution line preserved across updates
// - ✅ `DomainRecordDuplicate` reported as a duplicate value, not a failure
// - ❌ NO retry logic
// - ❌ NO record creation
//
// ## Trust Level: Untrusted (DNS Provider)
//
// See the `DnsProvider` trait for the allowed and forbidden capabilities.
//
// ## Security Requirements
//
// - The AccessKey secret NEVER appears in logs or in request URLs
//
// ## API Reference
//
// - API version 2015-01-09, RPC style, parameters in the query string
// - DescribeDomains: list domains owned by the account
// - DescribeDomainRecords: list records of a domain
// - UpdateDomainRecord: overwrite a record by RecordId

mod sign;
mod types;

use async_trait::async_trait;
use chrono::Utc;
use ddns_core::config::{ProviderConfig, RecordTarget};
use ddns_core::traits::{DnsProvider, DnsProviderFactory, DnsRecord, Zone};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use sign::{EMPTY_BODY_SHA256, SigningRequest};
use std::collections::BTreeMap;
use std::time::Duration;
use types::{
    AliyunErrorResponse, AliyunRecord, DescribeDomainRecordsResponse, DescribeDomainsResponse,
    UpdateDomainRecordResponse, to_query_string,
};

/// Aliyun DNS API version
const ALIYUN_DNS_VERSION: &str = "2015-01-09";

/// Largest page the list APIs accept
const MAX_PAGE_SIZE: u32 = 100;

/// Error code for an update whose values match the stored record
const DUPLICATE_RECORD_CODE: &str = "DomainRecordDuplicate";

/// Error codes meaning the domain or record does not exist
const NOT_FOUND_CODES: &[&str] = &["InvalidDomainName.NoExist", "DomainRecordNotBelongToUser"];

const PROVIDER: &str = "aliyun";

/// Aliyun DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the AccessKey secret.
pub struct AliyunProvider {
    access_key_id: String,

    /// ⚠️ NEVER log this value
    access_key_secret: String,

    /// API endpoint, e.g. `https://alidns.cn-hangzhou.aliyuncs.com`
    endpoint: String,

    /// `host[:port]` of the endpoint, as signed
    host: String,

    client: reqwest::Client,
}

impl std::fmt::Debug for AliyunProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliyunProvider")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AliyunProvider {
    /// Create a new Aliyun provider for the given region
    ///
    /// # Errors
    ///
    /// `Error::Config` if a credential or the region is empty.
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
        region: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.is_empty() || access_key_secret.is_empty() {
            return Err(Error::config(
                "Aliyun access_key_id and access_key_secret cannot be empty",
            ));
        }
        if region.is_empty() {
            return Err(Error::config("Aliyun region cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let provider = Self {
            access_key_id,
            access_key_secret,
            endpoint: String::new(),
            host: String::new(),
            client,
        };
        provider.with_endpoint(format!("https://alidns.{}.aliyuncs.com", region))
    }

    /// Point the provider at a different API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let url = reqwest::Url::parse(&endpoint)
            .map_err(|e| Error::config(format!("Invalid Aliyun endpoint {}: {}", endpoint, e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("Aliyun endpoint has no host: {}", endpoint)))?;

        self.host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        self.endpoint = endpoint;
        Ok(self)
    }

    /// Execute a signed RPC call
    ///
    /// `duplicate_value` is the value being written, when the call is an
    /// update; `DomainRecordDuplicate` is then reported as
    /// `Error::DuplicateValue`.
    async fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &BTreeMap<&str, String>,
        duplicate_value: Option<&str>,
    ) -> Result<T> {
        let query_string = to_query_string(params);
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let authorization = sign::authorization(
            &self.access_key_id,
            &self.access_key_secret,
            &SigningRequest {
                host: &self.host,
                action,
                version: ALIYUN_DNS_VERSION,
                query_string: &query_string,
                timestamp: &timestamp,
                nonce: &nonce,
            },
        )?;

        let url = if query_string.is_empty() {
            format!("{}/", self.endpoint)
        } else {
            format!("{}/?{}", self.endpoint, query_string)
        };
        tracing::debug!("POST {}/ (Action: {})", self.endpoint, action);

        let response = self
            .client
            .post(&url)
            .header("x-acs-action", action)
            .header("x-acs-version", ALIYUN_DNS_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", EMPTY_BODY_SHA256)
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| Error::network(format!("Aliyun {} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read Aliyun response: {}", e)))?;

        if let Ok(AliyunErrorResponse {
            code: Some(code),
            message,
        }) = serde_json::from_str::<AliyunErrorResponse>(&body)
        {
            let message = message.unwrap_or_default();
            tracing::debug!("Aliyun API error: {} - {}", code, message);
            return Err(map_api_error(status.as_u16(), &code, &message, duplicate_value));
        }

        if !status.is_success() {
            return Err(Error::provider_status(
                PROVIDER,
                status.as_u16(),
                format!("{} failed: {}", action, body.trim()),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(PROVIDER, format!("Failed to parse {} response: {}", action, e))
        })
    }
}

/// Map an API error code to an error variant
fn map_api_error(status: u16, code: &str, message: &str, duplicate_value: Option<&str>) -> Error {
    match (code, duplicate_value) {
        (DUPLICATE_RECORD_CODE, Some(value)) => Error::duplicate_value(PROVIDER, value),
        _ if NOT_FOUND_CODES.contains(&code) => {
            Error::not_found(format!("Aliyun {}: {}", code, message))
        }
        _ => Error::provider_status(PROVIDER, status, format!("{}: {}", code, message)),
    }
}

fn to_record(record: AliyunRecord) -> DnsRecord {
    DnsRecord {
        id: record.record_id,
        name: record.rr,
        record_type: record.record_type,
        value: record.value,
        ttl: record.ttl,
        extra: serde_json::json!({ "line": record.line }),
    }
}

#[async_trait]
impl DnsProvider for AliyunProvider {
    async fn resolve_zone(&self, domain_name: &str) -> Result<Zone> {
        let mut params = BTreeMap::new();
        params.insert("KeyWord", domain_name.to_string());
        params.insert("PageSize", MAX_PAGE_SIZE.to_string());

        let response: DescribeDomainsResponse =
            self.request("DescribeDomains", &params, None).await?;

        // Aliyun keys records on the domain name itself
        response
            .domains
            .map(|d| d.domain)
            .unwrap_or_default()
            .into_iter()
            .find(|d| d.domain_name == domain_name)
            .map(|d| Zone::new(d.domain_name.clone(), d.domain_name))
            .ok_or_else(|| Error::not_found(format!("Domain not found: {}", domain_name)))
    }

    async fn find_record(&self, zone: &Zone, target: &RecordTarget) -> Result<DnsRecord> {
        let label = target.label();

        let mut params = BTreeMap::new();
        params.insert("DomainName", zone.name.clone());
        params.insert("RRKeyWord", label.clone());
        params.insert("SearchMode", "EXACT".to_string());
        params.insert("Type", target.record_type.clone());
        params.insert("PageSize", MAX_PAGE_SIZE.to_string());

        let response: DescribeDomainRecordsResponse =
            self.request("DescribeDomainRecords", &params, None).await?;

        // Older API versions ignore SearchMode and match RRKeyWord fuzzily
        response
            .domain_records
            .map(|r| r.record)
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.rr == label && r.record_type == target.record_type)
            .map(to_record)
            .ok_or_else(|| {
                Error::not_found(format!(
                    "DNS record not found: {} in {} (type: {})",
                    label, zone.name, target.record_type
                ))
            })
    }

    async fn update_record(&self, _zone: &Zone, record: &DnsRecord, new_value: &str) -> Result<()> {
        let mut params = BTreeMap::new();
        params.insert("RecordId", record.id.clone());
        params.insert("RR", record.name.clone());
        params.insert("Type", record.record_type.clone());
        params.insert("Value", new_value.to_string());
        if let Some(ttl) = record.ttl {
            params.insert("TTL", ttl.to_string());
        }
        if let Some(line) = record.extra["line"].as_str() {
            params.insert("Line", line.to_string());
        }

        let _: UpdateDomainRecordResponse = self
            .request("UpdateDomainRecord", &params, Some(new_value))
            .await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Aliyun providers
pub struct AliyunFactory;

impl DnsProviderFactory for AliyunFactory {
    fn create(&self, config: &ProviderConfig, timeout: Duration) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Aliyun {
                access_key_id,
                access_key_secret,
                region,
            } => Ok(Box::new(AliyunProvider::new(
                access_key_id.clone(),
                access_key_secret.clone(),
                region,
                timeout,
            )?)),
            _ => Err(Error::config("Invalid config for Aliyun provider")),
        }
    }
}

/// Register the Aliyun provider with a registry
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(AliyunFactory));
}
