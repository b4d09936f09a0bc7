//! Integration tests for the request dispatcher
//!
//! Exercise the live path and the HTTP fixture source against a local mock
//! backend.

use mock_api::prelude::*;
use mock_api::{HttpFixtureSource, HttpMethod, NetworkConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instant_network() -> NetworkConfig {
    NetworkConfig {
        latency_min_ms: 0,
        latency_max_ms: 0,
        failure_rate: 0.0,
        ..Default::default()
    }
}

async fn live_service(base_url: &str) -> MockApiService {
    MockApiService::builder()
        .global_mode(ApiMode::Live)
        .live_base_url(base_url)
        .network_config(instant_network())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_live_get_uses_base_url_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/campaigns/list"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "campaigns": [{ "id": "live_001", "status": "active" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = live_service(&server.uri()).await;
    let response = service
        .make_request(
            "campaigns/list",
            Some(json!({ "ignored": true })),
            RequestOptions::new().with_method(HttpMethod::Get),
        )
        .await
        .unwrap();

    assert_eq!(
        response,
        json!({ "campaigns": [{ "id": "live_001", "status": "active" }] })
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_live_post_sends_json_payload() {
    let server = MockServer::start().await;
    let payload = json!({ "name": "Spring Promo", "budget": 5000 });

    Mock::given(method("POST"))
        .and(path("/campaigns/create"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "camp_42" })))
        .expect(1)
        .mount(&server)
        .await;

    let service = live_service(&server.uri()).await;
    let response = service
        .make_request(
            "campaigns/create",
            Some(payload),
            RequestOptions::new().with_method(HttpMethod::Post),
        )
        .await
        .unwrap();

    assert_eq!(response["id"], "camp_42");
}

#[tokio::test]
async fn test_endpoint_url_and_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/reports/export"))
        .and(header("X-Report-Format", "csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "url": "export.csv" })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = EndpointRegistry::from_yaml_str(&format!(
        r#"
version: "1"
endpoints:
  - endpoint: reports/export
    name: Export Reports
    default_mode: live
    live_api_url: "{}/v2"
    headers:
      X-Report-Format: csv
    category: reports
    methods: [POST]
    requires_auth: true
    permissions: [reports.export]
"#,
        server.uri()
    ))
    .unwrap();

    let service = MockApiService::builder()
        .registry(registry)
        .global_mode(ApiMode::Hybrid)
        .live_base_url("http://127.0.0.1:9")
        .network_config(instant_network())
        .build()
        .await
        .unwrap();

    let response = service
        .make_request(
            "reports/export",
            None,
            RequestOptions::new().with_method(HttpMethod::Post),
        )
        .await
        .unwrap();
    assert_eq!(response["url"], "export.csv");
}

#[tokio::test]
async fn test_hybrid_override_routes_live() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let service = MockApiService::builder()
        .global_mode(ApiMode::Hybrid)
        .live_base_url(server.uri())
        .network_config(instant_network())
        .build()
        .await
        .unwrap();

    service.set_endpoint_mode("users/list", RouteMode::Live, None);
    let live = service
        .make_request("users/list", None, RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(live, json!({ "users": [] }));

    // forcing mock for one call leaves the backend untouched
    let forced = service
        .make_request(
            "users/list",
            None,
            RequestOptions::new().with_force_mode(RouteMode::Mock),
        )
        .await;
    assert!(matches!(forced, Err(MockApiError::EndpointNotFound(_))));
}

#[tokio::test]
async fn test_non_success_status_is_live_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/dashboard"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let service = live_service(&server.uri()).await;
    let error = service
        .make_request("reports/dashboard", None, RequestOptions::new())
        .await
        .unwrap_err();

    match error {
        MockApiError::LiveRequestFailed { status, message } => {
            assert_eq!(status, Some(503));
            assert_eq!(message, "HTTP 503: Service Unavailable");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_live_call_bounded_by_network_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stores/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "stores": [] }))
                .set_delay(Duration::from_millis(1_000)),
        )
        .mount(&server)
        .await;

    let service = MockApiService::builder()
        .global_mode(ApiMode::Live)
        .live_base_url(server.uri())
        .network_config(NetworkConfig {
            timeout_ms: 50,
            ..instant_network()
        })
        .build()
        .await
        .unwrap();

    let error = service
        .make_request("stores/list", None, RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        MockApiError::LiveRequestFailed { status: None, .. }
    ));
}

#[tokio::test]
async fn test_http_fixture_fetched_once_until_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mock/responses/campaigns-list.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": { "campaigns": [{ "id": "served_001" }] }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let service = MockApiService::builder()
        .fixture_source(Arc::new(HttpFixtureSource::new(server.uri())))
        .network_config(instant_network())
        .build()
        .await
        .unwrap();

    let first = service.load_fixture("campaigns-list.json").await.unwrap();
    let second = service.load_fixture("campaigns-list.json").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let response = service
        .make_request("campaigns/list", None, RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(response["campaigns"][0]["id"], "served_001");

    service.clear_cache();
    service.load_fixture("campaigns-list.json").await.unwrap();
}

#[tokio::test]
async fn test_missing_served_fixture_uses_builtin_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mock/responses/auth-login.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let service = MockApiService::builder()
        .fixture_source(Arc::new(HttpFixtureSource::new(server.uri())))
        .network_config(instant_network())
        .build()
        .await
        .unwrap();

    let session = service
        .login(&LoginCredentials {
            email: "someone@boosttrade.com".to_string(),
            password: "secret".to_string(),
            role: Some(Role::PosAdmin),
        })
        .await
        .unwrap();

    assert_eq!(session.user.role, Role::PosAdmin);
    assert_eq!(session.token, "file-pos-token");
}
