//! HTTP transport against a local mock server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use keyslot_core::transport::{RequestOptions, Transport, TransportError};
use keyslot_http::{HttpTransport, HttpTransportConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = HttpTransportConfig::default().with_single_base_url(server.uri());
    HttpTransport::new(config).unwrap()
}

#[tokio::test]
async fn test_get_sends_query_and_json_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("page", "2"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": "1"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let response = transport
        .get("/agents", RequestOptions::new().with_params(json!({"page": 2})))
        .await
        .unwrap();

    assert_eq!(response, json!({"data": [{"id": "1"}]}));
}

#[tokio::test]
async fn test_post_sends_json_body_and_extra_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agents/7/chat"))
        .and(header("x-trace", "abc"))
        .and(body_json(json!({"message": "hi"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"reply": "hello"})))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let response = transport
        .post(
            "/agents/7/chat",
            json!({"message": "hi"}),
            RequestOptions::new().with_header("x-trace", "abc"),
        )
        .await
        .unwrap();

    assert_eq!(response, json!({"reply": "hello"}));
}

#[tokio::test]
async fn test_delete_sends_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/agents/7"))
        .and(body_json(json!({"force": true})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let response = transport
        .delete("/agents/7", json!({"force": true}), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response, json!(null));
}

#[tokio::test]
async fn test_error_status_becomes_rejection_with_detail() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/agents/7"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"name": ["required"]})))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let error = transport
        .patch("/agents/7", json!({}), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(422));
    assert_eq!(
        error.response(),
        Some(&json!({"status": 422, "data": {"name": ["required"]}}))
    );
}

#[tokio::test]
async fn test_plain_text_error_body_is_kept_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/settings"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let error = transport
        .put("/settings", json!({"theme": "dark"}), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(
        error,
        TransportError::rejected(json!({"status": 500, "data": "boom"}))
    );
}

#[tokio::test]
async fn test_undecodable_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let error = transport.get("/health", RequestOptions::new()).await.unwrap_err();

    assert!(matches!(error, TransportError::Decode(_)));
    assert!(error.response().is_none());
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let transport = HttpTransport::new(HttpTransportConfig::default().with_single_base_url(uri)).unwrap();
    let error = transport.get("/agents", RequestOptions::new()).await.unwrap_err();

    assert!(matches!(error, TransportError::Connection(_)));
}

#[tokio::test]
async fn test_array_params_repeat_the_query_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(query_param("status", "idle"))
        .and(query_param("status", "busy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let response = transport
        .get(
            "/agents",
            RequestOptions::new().with_params(json!({"status": ["idle", "busy"]})),
        )
        .await
        .unwrap();

    assert_eq!(response, json!([]));
}

#[tokio::test]
async fn test_non_object_params_are_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let transport = transport_for(&server);
    let error = transport
        .get("/agents", RequestOptions::new().with_params(json!([1, 2])))
        .await
        .unwrap_err();

    assert!(matches!(error, TransportError::InvalidRequest(_)));
    assert!(error.response().is_none());
}

#[tokio::test]
async fn test_with_client_uses_the_given_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .and(header("x-client", "dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert("x-client", reqwest::header::HeaderValue::from_static("dashboard"));
    let client = reqwest::Client::builder().default_headers(headers).build().unwrap();
    let config = HttpTransportConfig::default().with_single_base_url(server.uri());
    let transport = HttpTransport::with_client(client, config);

    assert_eq!(transport.config().base_url, server.uri());
    let response = transport.get("/agents", RequestOptions::new()).await.unwrap();
    assert_eq!(response, json!({"ok": true}));
}
