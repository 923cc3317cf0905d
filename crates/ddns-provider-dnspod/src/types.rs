//! DNSPod (dnsapi.cn) wire types

use serde::{Deserialize, Deserializer};

/// Status block carried by every response
#[derive(Debug, Deserialize)]
pub(crate) struct DnspodStatus {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusOnly {
    pub status: DnspodStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainListResponse {
    #[serde(default)]
    pub domains: Vec<DnspodDomain>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DnspodDomain {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordListResponse {
    #[serde(default)]
    pub records: Vec<DnspodRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DnspodRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub ttl: Option<String>,
    #[serde(default)]
    pub line: Option<String>,
}

/// DNSPod returns numeric fields as strings in some actions and numbers in others
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
