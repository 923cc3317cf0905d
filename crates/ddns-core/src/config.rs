//! Configuration types for the DDNS system
//!
//! A run is driven by one immutable [`DdnsConfig`] loaded from a JSON
//! document. Components never read configuration from globals; the values
//! they need are passed in at construction time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default IP echo service (IPv4-only endpoint, plain-text body)
pub const DEFAULT_IP_SOURCE_URL: &str = "https://ipv4.icanhazip.com";

/// Default per-request timeout for every outbound call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default Aliyun DNS region
pub const DEFAULT_ALIYUN_REGION: &str = "cn-hangzhou";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Target zone / domain (e.g. "example.com")
    pub domain_name: String,

    /// Target record label (e.g. "home", or "@" for the apex)
    pub record_name: String,

    /// DNS record type
    #[serde(default = "default_record_type")]
    pub record_type: String,

    /// TTL to write on update; the record's current TTL is kept when absent
    #[serde(default)]
    pub ttl: Option<u32>,

    /// External IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Timeout applied to each outbound HTTP call (in seconds)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl DdnsConfig {
    /// Create a new configuration with defaults for the optional fields
    pub fn new(
        provider: ProviderConfig,
        domain_name: impl Into<String>,
        record_name: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            domain_name: domain_name.into(),
            record_name: record_name.into(),
            record_type: default_record_type(),
            ttl: None,
            ip_source: IpSourceConfig::default(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json_str(&contents)
    }

    /// Parse and validate a configuration document
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.domain_name.trim().is_empty() {
            return Err(Error::config("domain_name cannot be empty"));
        }
        if self.record_name.trim().is_empty() {
            return Err(Error::config("record_name cannot be empty"));
        }
        if self.record_type.trim().is_empty() {
            return Err(Error::config("record_type cannot be empty"));
        }
        if self.record_type != "A" {
            return Err(Error::config(format!(
                "record_type '{}' is not supported; only A records are managed",
                self.record_type
            )));
        }
        if !(1..=300).contains(&self.http_timeout_secs) {
            return Err(Error::config(format!(
                "http_timeout_secs must be between 1 and 300. Got: {}",
                self.http_timeout_secs
            )));
        }

        self.provider.validate()?;
        self.ip_source.validate()?;

        Ok(())
    }

    /// The record this run reconciles
    pub fn target(&self) -> RecordTarget {
        RecordTarget {
            domain_name: self.domain_name.clone(),
            record_name: self.record_name.clone(),
            record_type: self.record_type.clone(),
            ttl: self.ttl,
        }
    }

    /// Per-request HTTP timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// External IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL of a plain-text IP echo service
    #[serde(default = "default_ip_source_url")]
    pub url: String,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::config("ip_source.url cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(Error::config(format!(
                "ip_source.url must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: default_ip_source_url(),
        }
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider (bearer token)
    Cloudflare {
        /// Cloudflare API token with Zone:DNS:Edit permissions
        api_token: String,
    },

    /// Aliyun DNS provider (signed requests)
    Aliyun {
        /// AccessKey ID
        access_key_id: String,
        /// AccessKey secret
        access_key_secret: String,
        /// API region
        #[serde(default = "default_aliyun_region")]
        region: String,
    },

    /// DNSPod provider (login token)
    Dnspod {
        /// Login token in "ID,Token" form
        login_token: String,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Cloudflare { api_token } => {
                if api_token.is_empty() {
                    return Err(Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Aliyun {
                access_key_id,
                access_key_secret,
                region,
            } => {
                if access_key_id.is_empty() || access_key_secret.is_empty() {
                    return Err(Error::config(
                        "Aliyun access_key_id and access_key_secret cannot be empty",
                    ));
                }
                if region.is_empty() {
                    return Err(Error::config("Aliyun region cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Dnspod { login_token } => match login_token.split_once(',') {
                Some((id, token)) if !id.trim().is_empty() && !token.trim().is_empty() => Ok(()),
                _ => Err(Error::config(
                    "DNSPod login_token must have the form 'ID,Token'",
                )),
            },
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(Error::config("Custom provider factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(Error::config("Custom provider config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Aliyun { .. } => "aliyun",
            ProviderConfig::Dnspod { .. } => "dnspod",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials must never reach logs, so Debug redacts them
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare { .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<REDACTED>")
                .finish(),
            ProviderConfig::Aliyun {
                access_key_id,
                region,
                ..
            } => f
                .debug_struct("Aliyun")
                .field("access_key_id", access_key_id)
                .field("access_key_secret", &"<REDACTED>")
                .field("region", region)
                .finish(),
            ProviderConfig::Dnspod { .. } => f
                .debug_struct("Dnspod")
                .field("login_token", &"<REDACTED>")
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

/// The desired state of the single managed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Zone / domain name
    pub domain_name: String,
    /// Record label as configured ("@" for the apex)
    pub record_name: String,
    /// Record type
    pub record_type: String,
    /// TTL override for updates
    pub ttl: Option<u32>,
}

impl RecordTarget {
    /// Create a target with no TTL override
    pub fn new(
        domain_name: impl Into<String>,
        record_name: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            domain_name: domain_name.into(),
            record_name: record_name.into(),
            record_type: record_type.into(),
            ttl: None,
        }
    }

    /// Fully-qualified record name, for providers keyed on full names
    ///
    /// `home` + `example.com` -> `home.example.com`, `@` -> `example.com`.
    /// A record name that is already qualified is returned unchanged.
    pub fn fqdn(&self) -> String {
        let domain = self.domain_name.trim_end_matches('.');
        let name = self.record_name.trim_end_matches('.');

        if name == "@" || name == domain {
            domain.to_string()
        } else if name.ends_with(&format!(".{}", domain)) {
            name.to_string()
        } else {
            format!("{}.{}", name, domain)
        }
    }

    /// Zone-relative label, for providers keyed on host labels
    ///
    /// `home.example.com` -> `home`, `example.com` -> `@`.
    pub fn label(&self) -> String {
        let domain = self.domain_name.trim_end_matches('.');
        let name = self.record_name.trim_end_matches('.');

        if name == domain {
            "@".to_string()
        } else if let Some(label) = name.strip_suffix(&format!(".{}", domain)) {
            label.to_string()
        } else {
            name.to_string()
        }
    }
}

fn default_record_type() -> String {
    "A".to_string()
}

fn default_ip_source_url() -> String {
    DEFAULT_IP_SOURCE_URL.to_string()
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_aliyun_region() -> String {
    DEFAULT_ALIYUN_REGION.to_string()
}
