//! Cloudflare provider against a mock API server

use ddns_core::config::RecordTarget;
use ddns_core::traits::{DnsProvider, DnsRecord, Zone};
use ddns_core::{Error, ErrorKind};
use ddns_provider_cloudflare::CloudflareProvider;
use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

const TOKEN: &str = "test-token";

fn provider(server: &mockito::ServerGuard) -> CloudflareProvider {
    CloudflareProvider::new(TOKEN, Duration::from_secs(5))
        .expect("provider builds")
        .with_base_url(server.url())
}

fn home_record(ttl: Option<u32>, proxied: bool) -> DnsRecord {
    DnsRecord {
        id: "rec-1".to_string(),
        name: "home.example.com".to_string(),
        record_type: "A".to_string(),
        value: "1.2.3.4".to_string(),
        ttl,
        extra: json!({ "proxied": proxied }),
    }
}

#[tokio::test]
async fn resolve_zone_requires_exact_name() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/zones")
        .match_query(Matcher::UrlEncoded("name".into(), "example.com".into()))
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": [
                    { "id": "zone-other", "name": "notexample.com" },
                    { "id": "zone-1", "name": "example.com" }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = provider(&server)
        .resolve_zone("example.com")
        .await
        .expect("zone resolves");

    assert_eq!(zone, Zone::new("zone-1", "example.com"));
    mock.assert_async().await;
}

#[tokio::test]
async fn resolve_zone_without_match_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/zones")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "success": true, "errors": [], "result": [] }).to_string())
        .create_async()
        .await;

    let err = provider(&server).resolve_zone("example.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn find_record_queries_fqdn_and_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/zones/zone-1/dns_records")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".into(), "home.example.com".into()),
            Matcher::UrlEncoded("type".into(), "A".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": [{
                    "id": "rec-1",
                    "type": "A",
                    "name": "home.example.com",
                    "content": "1.2.3.4",
                    "ttl": 300,
                    "proxied": true
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    let target = RecordTarget::new("example.com", "home", "A");
    let record = provider(&server)
        .find_record(&zone, &target)
        .await
        .expect("record found");

    assert_eq!(record, home_record(Some(300), true));
    mock.assert_async().await;
}

#[tokio::test]
async fn find_record_ignores_other_types() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/zones/zone-1/dns_records")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": [{
                    "id": "rec-txt",
                    "type": "TXT",
                    "name": "home.example.com",
                    "content": "hello"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    let target = RecordTarget::new("example.com", "home", "A");
    let err = provider(&server).find_record(&zone, &target).await.unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn update_record_preserves_ttl_and_proxied() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/zones/zone-1/dns_records/rec-1")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::Json(json!({
            "type": "A",
            "name": "home.example.com",
            "content": "5.6.7.8",
            "ttl": 300,
            "proxied": true
        })))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": {
                    "id": "rec-1",
                    "type": "A",
                    "name": "home.example.com",
                    "content": "5.6.7.8",
                    "ttl": 300,
                    "proxied": true
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    provider(&server)
        .update_record(&zone, &home_record(Some(300), true), "5.6.7.8")
        .await
        .expect("update succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn update_record_defaults_to_automatic_ttl() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/zones/zone-1/dns_records/rec-1")
        .match_body(Matcher::PartialJson(json!({ "ttl": 1, "proxied": false })))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "errors": [],
                "result": {
                    "id": "rec-1",
                    "type": "A",
                    "name": "home.example.com",
                    "content": "5.6.7.8"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    provider(&server)
        .update_record(&zone, &home_record(None, false), "5.6.7.8")
        .await
        .expect("update succeeds");

    mock.assert_async().await;
}

#[tokio::test]
async fn identical_record_error_is_duplicate_value() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/zones/zone-1/dns_records/rec-1")
        .with_status(400)
        .with_body(
            json!({
                "success": false,
                "errors": [{ "code": 81058, "message": "An identical record already exists." }],
                "result": null
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    let err = provider(&server)
        .update_record(&zone, &home_record(None, false), "5.6.7.8")
        .await
        .unwrap_err();

    assert!(err.is_duplicate());
}

#[tokio::test]
async fn missing_record_on_update_is_provider_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/zones/zone-1/dns_records/rec-1")
        .with_status(404)
        .with_body(
            json!({
                "success": false,
                "errors": [{ "code": 81044, "message": "Record does not exist." }],
                "result": null
            })
            .to_string(),
        )
        .create_async()
        .await;

    let zone = Zone::new("zone-1", "example.com");
    let err = provider(&server)
        .update_record(&zone, &home_record(None, false), "5.6.7.8")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Provider);
    assert!(matches!(err, Error::Provider { status: Some(404), .. }));
}

#[tokio::test]
async fn auth_failure_is_provider_error_with_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/zones")
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(
            json!({
                "success": false,
                "errors": [{ "code": 9109, "message": "Unauthorized to access requested resource" }],
                "result": null
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = provider(&server).resolve_zone("example.com").await.unwrap_err();

    assert!(matches!(err, Error::Provider { status: Some(403), .. }));
    assert!(!err.to_string().contains(TOKEN));
}
