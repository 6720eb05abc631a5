// Integration tests for `PoolClient` using wiremock.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use poolsync_api::error::messages;
use poolsync_api::{
    ErrorKind, PoolClient, PoolId, RecommendationStatus, StaticToken, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PoolClient) {
    let server = MockServer::start().await;
    let client = PoolClient::with_client(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
        Arc::new(StaticToken::new("test-token")),
    );
    (server, client)
}

fn pool() -> PoolId {
    PoolId::from(1234)
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_discover_pools() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1234, "name": "Backyard", "type": "outdoor_inground_pool", "volume": 42 },
            { "id": 5678, "name": "Spa", "volume": 1.5 }
        ])))
        .mount(&server)
        .await;

    let pools = client.discover_pools().await.unwrap();

    assert_eq!(pools.len(), 2);
    assert_eq!(pools[0].id, pool());
    assert_eq!(pools[0].name, "Backyard");
    assert_eq!(pools[0].volume, Some(42.0));
    assert_eq!(pools[1].volume, Some(1.5));
}

#[tokio::test]
async fn test_discover_pools_blank_body_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(200).set_body_string("  "))
        .mount(&server)
        .await;

    assert!(client.discover_pools().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_discover_pools_null_body_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    assert!(client.discover_pools().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/device"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "0fe6c3b2-7d1f-4a0c-9c4e-2f0b6a0a1d55",
            "serial_number": "ICO-000123",
            "sw_version": "1.5.1"
        })))
        .mount(&server)
        .await;

    let device = client.fetch_device(&pool()).await.unwrap();

    assert_eq!(device.serial_number.as_deref(), Some("ICO-000123"));
    assert_eq!(device.sw_version.as_deref(), Some("1.5.1"));
    assert_eq!(device.volume, None);
}

#[tokio::test]
async fn test_fetch_measurements_sends_all_types() {
    let (server, client) = setup().await;

    let mut mock = Mock::given(method("GET")).and(path("/pools/1234/lastmeasures"));
    for t in ["temperature", "ph", "orp", "salt", "tds", "battery", "rssi"] {
        mock = mock.and(query_param("types[]", t));
    }

    mock.respond_with(ResponseTemplate::new(200).set_body_json(json!([
        { "data_type": "temperature", "value": 26.4, "value_time": "2024-06-01 08:15:42", "is_valid": true },
        { "data_type": "ph", "value": 7.2, "value_time": "2024-06-01 08:15:42", "is_valid": true }
    ])))
    .expect(1)
    .mount(&server)
    .await;

    let measures = client.fetch_measurements(&pool()).await.unwrap();

    assert_eq!(measures.len(), 2);
    assert_eq!(measures[0].data_type, "temperature");
    assert_eq!(measures[0].value, 26.4);
    assert!(measures[0].timestamp().is_some());

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_owned();
    assert_eq!(query.matches("types%5B%5D=").count(), 7, "query was {query}");
}

#[tokio::test]
async fn test_fetch_recommendations() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Low pH", "message": "Add pH+", "status": "waiting",
              "created_at": "2024-06-01T08:00:00+0000" },
            { "id": 2, "title": "Filter", "message": "Clean it", "status": "ok" }
        ])))
        .mount(&server)
        .await;

    let recs = client.fetch_recommendations(&pool()).await.unwrap();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].id, "1");
    assert_eq!(recs[0].status, RecommendationStatus::Waiting);
    assert_eq!(recs[1].status, RecommendationStatus::Other);
}

#[tokio::test]
async fn test_fetch_recommendations_empty_bodies_are_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pools/1234/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    assert!(client.fetch_recommendations(&pool()).await.unwrap().is_empty());
    assert!(client.fetch_recommendations(&pool()).await.unwrap().is_empty());
}

// ── Error classification tests ──────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_statuses() {
    for status in [401_u16, 403] {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/pools/1234/device"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let err = client.fetch_device(&pool()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.status(), Some(status));
    }
}

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/recommendations"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.fetch_recommendations(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), messages::NOT_FOUND);
}

#[tokio::test]
async fn test_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/lastmeasures"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client.fetch_measurements(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.status(), Some(503));
    assert_eq!(err.to_string(), messages::SERVER_ERROR);
}

#[tokio::test]
async fn test_vendor_error_description_wins() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token has been revoked"
        })))
        .mount(&server)
        .await;

    let err = client.discover_pools().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(err.to_string(), "Refresh token has been revoked");
}

#[tokio::test]
async fn test_non_object_success_body_is_invalid() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/device"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Service temporarily moved"))
        .mount(&server)
        .await;

    let err = client.fetch_device(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_wrong_shape_is_invalid() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/lastmeasures"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let err = client.fetch_measurements(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_empty_body_is_invalid_for_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools/1234/device"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client.fetch_device(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1.
    let client = PoolClient::new(
        "http://127.0.0.1:1".parse().unwrap(),
        Arc::new(StaticToken::new("t")),
        &TransportConfig::default().with_timeout(Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.fetch_device(&pool()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(err.status(), None);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let (server, _) = setup().await;

    Mock::given(method("GET"))
        .and(path("/pools"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = PoolClient::new(
        server.uri().parse().unwrap(),
        Arc::new(StaticToken::new("t")),
        &TransportConfig::default().with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    let err = client.discover_pools().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkError);
    assert_eq!(err.to_string(), messages::NETWORK);
}
