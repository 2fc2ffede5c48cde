//! Dashboard panels against a scripted transport

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use dashboard::{describe_slot, keys, urls, Dashboard};
use keyslot_core::transport::{TransportError, Verb};
use keyslot_testing::MockTransport;
use serde_json::json;

#[tokio::test]
async fn test_panels_settle_independently() {
    let transport = MockTransport::new();
    transport.respond_ok(Verb::Get, urls::AGENTS, json!({"data": [{"id": "1"}]}));
    transport.respond_err(
        Verb::Get,
        urls::AGENT_CHAT_HISTORY,
        TransportError::rejected(json!({"status": 500})),
    );
    transport.respond_ok(Verb::Get, urls::DASHBOARD_METRICS, json!({"active_agents": 1}));

    let dashboard = Dashboard::new(transport.clone());
    let (agents, history, metrics) = dashboard.load_all("1").await;

    assert!(agents.is_ok());
    assert!(history.is_err());
    assert!(metrics.is_ok());

    let flat = dashboard.store().flatten().await;
    assert_eq!(flat["AGENTS.RESPONSE"], json!({"data": [{"id": "1"}]}));
    assert_eq!(flat["AGENT_CHAT_HISTORY.ERROR"], json!({"status": 500}));
    assert_eq!(flat["AGENT_CHAT_HISTORY.PARAMS"], json!({"agent_id": "1", "page": 1, "page_size": 20}));
    assert_eq!(flat["DASHBOARD_METRICS.ERROR"], json!(false));
}

#[tokio::test]
async fn test_chat_history_sends_paging_query() {
    let transport = MockTransport::new();
    transport.respond_ok(Verb::Get, urls::AGENT_CHAT_HISTORY, json!({"data": {"results": []}}));

    let dashboard = Dashboard::new(transport.clone());
    dashboard.load_chat_history("42", 3).await.unwrap();

    let call = &transport.calls()[0];
    assert_eq!(call.options.params, Some(json!({"agent_id": "42", "page": 3, "page_size": 20})));
}

#[tokio::test]
async fn test_chat_posts_message_body() {
    let transport = MockTransport::new();
    transport.respond_ok(Verb::Post, urls::AGENT_CHAT, json!({"data": {"response": "hi"}}));

    let dashboard = Dashboard::new(transport.clone());
    let reply = dashboard.send_chat("7", "hello").await.unwrap();

    assert_eq!(reply["data"]["response"], json!("hi"));
    assert_eq!(transport.calls()[0].body, json!({"message": "hello", "agent_id": "7"}));
}

#[tokio::test]
async fn test_describe_slot_renders_each_state() {
    let transport = MockTransport::new();
    let gate = transport.gate(Verb::Get, urls::DASHBOARD_METRICS);
    let dashboard = Dashboard::new(transport.clone());

    let state = dashboard.store().snapshot().await;
    assert_eq!(describe_slot(&state, keys::DASHBOARD_METRICS), "DASHBOARD_METRICS: idle");

    let pending = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.refresh_metrics().await })
    };
    transport.wait_for_calls(1).await;
    let state = dashboard.store().snapshot().await;
    assert_eq!(describe_slot(&state, keys::DASHBOARD_METRICS), "DASHBOARD_METRICS: loading");

    gate.reject(TransportError::rejected(json!({"status": 503})));
    assert!(pending.await.unwrap().is_err());
    let state = dashboard.store().snapshot().await;
    assert_eq!(
        describe_slot(&state, keys::DASHBOARD_METRICS),
        r#"DASHBOARD_METRICS: error {"status":503}"#
    );
}
