// # DNS Provider Trait
//
// Defines the interface for reading and updating a DNS record through a
// provider's HTTP API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate (bearer token)
// - Aliyun DNS: `ddns-provider-aliyun` crate (signed requests)
// - DNSPod: `ddns-provider-dnspod` crate (login token)
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, RecordTarget};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//     let target = RecordTarget::new("example.com", "home", "A");
//
//     let zone = provider.resolve_zone(&target.domain_name).await?;
//     let record = provider.find_record(&zone, &target).await?;
//     provider.update_record(&zone, &record, "5.6.7.8").await?;
//
//     Ok(())
// }
// ```

use crate::config::{ProviderConfig, RecordTarget};
use async_trait::async_trait;

/// A provider-side container for a domain's records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider identifier (the domain name itself for providers keyed on it)
    pub id: String,
    /// Domain name
    pub name: String,
}

impl Zone {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Read-only snapshot of a provider-side record
#[derive(Debug, Clone, PartialEq)]
pub struct DnsRecord {
    /// The record ID (provider-specific, opaque)
    pub id: String,
    /// The record name, as the provider reports it
    pub name: String,
    /// The record type (e.g. "A")
    pub record_type: String,
    /// The current value
    pub value: String,
    /// Time-to-live for the record
    pub ttl: Option<u32>,
    /// Any additional provider-specific metadata kept across updates
    pub extra: serde_json::Value,
}

impl DnsRecord {
    /// Create a record snapshot with no TTL or extra metadata
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl: None,
            extra: serde_json::Value::Null,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Implementations must handle the specifics of each provider's API and
/// translate its responses into [`crate::Error`] variants.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure (the external scheduler re-runs the job)
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
/// - ❌ Create records that do not exist
/// - ❌ Log credentials
///
/// ## Error Contract
///
/// | situation | error |
/// |---|---|
/// | transport failure, timeout, unreadable body | `Error::Network` |
/// | zone or record has no exact match | `Error::NotFound` |
/// | update rejected because the value is already stored | `Error::DuplicateValue` |
/// | any other non-success response | `Error::Provider` (with status) |
///
/// Duplicate detection keys on status codes or structured error codes,
/// never on message text.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a domain name to the provider's zone handle
    ///
    /// Lookup is an exact name match against the zones owned by the
    /// authenticated account.
    async fn resolve_zone(&self, domain_name: &str) -> Result<Zone, crate::Error>;

    /// Find the record matching the target's name and type exactly
    ///
    /// The first record whose name and type both match (case-sensitive) is
    /// returned.
    async fn find_record(
        &self,
        zone: &Zone,
        target: &RecordTarget,
    ) -> Result<DnsRecord, crate::Error>;

    /// Set the record's value, leaving its name and type unchanged
    ///
    /// The record's `ttl` and `extra` metadata are written back as given.
    async fn update_record(
        &self,
        zone: &Zone,
        record: &DnsRecord,
        new_value: &str,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    /// - `timeout`: Per-request HTTP timeout
    fn create(
        &self,
        config: &ProviderConfig,
        timeout: std::time::Duration,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
