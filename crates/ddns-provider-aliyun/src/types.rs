//! Aliyun DNS (2015-01-09) wire types and query encoding

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// RFC3986 percent-encoding (unreserved characters pass through)
pub(crate) fn url_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{:02X}", byte);
            }
        }
    }
    result
}

/// Encode parameters as a query string, sorted by key
pub(crate) fn to_query_string(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Error body returned with any failed call
#[derive(Debug, Deserialize)]
pub(crate) struct AliyunErrorResponse {
    #[serde(rename = "Code")]
    pub code: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescribeDomainsResponse {
    #[serde(rename = "Domains")]
    pub domains: Option<DomainsWrapper>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainsWrapper {
    #[serde(rename = "Domain", default)]
    pub domain: Vec<AliyunDomain>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliyunDomain {
    #[serde(rename = "DomainName")]
    pub domain_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords")]
    pub domain_records: Option<DomainRecordsWrapper>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DomainRecordsWrapper {
    #[serde(rename = "Record", default)]
    pub record: Vec<AliyunRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AliyunRecord {
    #[serde(rename = "RecordId")]
    pub record_id: String,
    #[serde(rename = "RR")]
    pub rr: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL")]
    pub ttl: Option<u32>,
    #[serde(rename = "Line")]
    pub line: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateDomainRecordResponse {
    #[serde(rename = "RecordId")]
    #[allow(dead_code)]
    pub record_id: Option<String>,
}
