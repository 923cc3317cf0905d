//! ACS3-HMAC-SHA256 request signing
//!
//! Reference: <https://www.alibabacloud.com/help/en/sdk/product-overview/v3-request-structure-and-signature>
//!
//! RPC-style requests carry their parameters in the query string and send
//! an empty body, so the payload hash is always [`EMPTY_BODY_SHA256`].

use ddns_core::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// SHA-256 of the empty body
pub(crate) const EMPTY_BODY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

/// Everything that goes into one request signature
pub(crate) struct SigningRequest<'a> {
    pub host: &'a str,
    pub action: &'a str,
    pub version: &'a str,
    pub query_string: &'a str,
    pub timestamp: &'a str,
    pub nonce: &'a str,
}

/// Build the `Authorization` header value for a request
pub(crate) fn authorization(
    access_key_id: &str,
    access_key_secret: &str,
    request: &SigningRequest<'_>,
) -> Result<String> {
    let canonical_headers = format!(
        "host:{}\nx-acs-action:{}\nx-acs-content-sha256:{}\nx-acs-date:{}\nx-acs-signature-nonce:{}\nx-acs-version:{}\n",
        request.host,
        request.action,
        EMPTY_BODY_SHA256,
        request.timestamp,
        request.nonce,
        request.version
    );

    let canonical_request = format!(
        "POST\n/\n{}\n{}\n{}\n{}",
        request.query_string, canonical_headers, SIGNED_HEADERS, EMPTY_BODY_SHA256
    );

    let hashed_canonical_request = hex::encode(Sha256::digest(canonical_request.as_bytes()));
    let string_to_sign = format!("ACS3-HMAC-SHA256\n{}", hashed_canonical_request);

    let signature = hex::encode(hmac_sha256(
        access_key_secret.as_bytes(),
        string_to_sign.as_bytes(),
    )?);

    Ok(format!(
        "ACS3-HMAC-SHA256 Credential={},SignedHeaders={},Signature={}",
        access_key_id, SIGNED_HEADERS, signature
    ))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::Other(format!("Invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
