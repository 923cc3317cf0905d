//! Cloudflare API v4 wire types

use serde::{Deserialize, Serialize};

/// Common response envelope
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
}

/// Envelope without a usable result, used to read errors off failures
#[derive(Debug, Deserialize)]
pub struct CloudflareErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    #[serde(default)]
    pub proxied: Option<bool>,
}

/// PUT body for a full record overwrite
#[derive(Debug, Serialize)]
pub struct UpdateDnsRecordRequest<'a> {
    #[serde(rename = "type")]
    pub record_type: &'a str,
    pub name: &'a str,
    pub content: &'a str,
    pub ttl: u32,
    pub proxied: bool,
}
