//! Source fetcher tests against a mock HTTP upstream.

use chrono::{TimeZone, Utc};
use mcpsync_core::{
    ChainFetcher, FetchError, RegistryFetcher, RegistryFetcherConfig, SourceFetcher,
};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tests::fixtures;

fn registry_fetcher(server: &MockServer) -> RegistryFetcher {
    RegistryFetcher::new(RegistryFetcherConfig::new(server.uri()))
}

// =============================================================================
// Registry pagination
// =============================================================================

#[tokio::test]
async fn test_pagination_accumulates_all_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [fixtures::registry_server_json("a/one", "https://one.example.com/mcp")],
            "metadata": {"next_cursor": "page-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [fixtures::registry_server_json("a/two", "https://two.example.com/mcp")],
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let records = registry_fetcher(&server).fetch(None).await.unwrap();

    let names: Vec<_> = records.iter().filter_map(|r| r.logical_name()).collect();
    assert_eq!(names, vec!["a/one", "a/two"]);
}

#[tokio::test]
async fn test_pagination_with_camel_case_cursor_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param_is_missing("cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [fixtures::registry_server_json("a/one", "https://one.example.com/mcp")],
            "metadata": {"nextCursor": "page-2"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [fixtures::registry_server_json("a/two", "https://two.example.com/mcp")],
            "metadata": {"nextCursor": null}
        })))
        .mount(&server)
        .await;

    let fetcher = RegistryFetcher::new(RegistryFetcherConfig {
        base_url: server.uri(),
        cursor_field: "nextCursor".to_string(),
        version_filter: None,
    });

    let records = fetcher.fetch(None).await.unwrap();
    assert_eq!(records.len(), 2);
}

// =============================================================================
// Incremental mode
// =============================================================================

#[tokio::test]
async fn test_watermark_is_sent_as_updated_since() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param("updated_since", "2026-01-15T08:30:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [],
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let watermark = Utc.with_ymd_and_hms(2026, 1, 15, 8, 30, 0).unwrap();
    let records = registry_fetcher(&server).fetch(Some(watermark)).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_full_sync_sends_no_updated_since() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param_is_missing("updated_since"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [],
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    registry_fetcher(&server).fetch(None).await.unwrap();
}

#[tokio::test]
async fn test_version_filter_is_sent_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .and(query_param("version", "latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "servers": [],
            "metadata": {}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RegistryFetcher::new(RegistryFetcherConfig {
        base_url: server.uri(),
        cursor_field: "next_cursor".to_string(),
        version_filter: Some("latest".to_string()),
    });

    fetcher.fetch(None).await.unwrap();
}

// =============================================================================
// Registry failure modes
// =============================================================================

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = registry_fetcher(&server).fetch(None).await.unwrap_err();
    match err {
        FetchError::UpstreamStatus { status, body, .. } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected UpstreamStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = registry_fetcher(&server).fetch(None).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

// =============================================================================
// Chain delegate failure domains
// =============================================================================

#[tokio::test]
async fn test_delegate_success_returns_chain_records() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fetch-chain-data"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            fixtures::chain_server_json("com.acme.ledger", "https://ledger.example.com/mcp"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = ChainFetcher::new(server.uri(), "s3cret".to_string());
    let records = fetcher.fetch(None).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].logical_name(), Some("com.acme.ledger"));
}

#[tokio::test]
async fn test_delegate_reported_failure_is_delegate_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fetch-chain-data"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Chain read failed",
            "details": "canister rejected the call"
        })))
        .mount(&server)
        .await;

    let fetcher = ChainFetcher::new(server.uri(), "s3cret".to_string());
    let err = fetcher.fetch(None).await.unwrap_err();

    match err {
        FetchError::Delegate { status, detail } => {
            assert_eq!(status, 500);
            assert!(detail.contains("Chain read failed"));
            assert!(detail.contains("canister rejected the call"));
        }
        other => panic!("expected Delegate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_delegate_is_transport_error() {
    // Nothing listens on port 1; the request never reaches a delegate.
    let fetcher = ChainFetcher::new("http://127.0.0.1:1".to_string(), "s3cret".to_string());
    let err = fetcher.fetch(None).await.unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }));
}
