//! Dashboard demo binary
//!
//! Loads every dashboard panel concurrently and prints the flat store.
//!
//! With `KEYSLOT_BASE_URL` set, requests go to that server over HTTP.
//! Otherwise a scripted in-process transport answers them.

use dashboard::{describe_slot, keys, urls, Dashboard};
use keyslot_core::transport::{Transport, TransportError, Verb};
use keyslot_http::{HttpTransport, HttpTransportConfig};
use keyslot_runtime::metrics::MetricsServer;
use keyslot_testing::MockTransport;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const AGENT_ID: &str = "1";

fn scripted_transport() -> MockTransport {
    let transport = MockTransport::new();
    transport.respond_ok(
        Verb::Get,
        urls::AGENTS,
        json!({"data": [{"id": "1", "name": "researcher"}, {"id": "2", "name": "writer"}]}),
    );
    transport.respond_ok(
        Verb::Get,
        urls::AGENT_CHAT_HISTORY,
        json!({"data": {"results": [{"id": 1, "message": "hello", "role": "human"}]}}),
    );
    transport.respond_ok(
        Verb::Get,
        urls::DASHBOARD_METRICS,
        json!({"active_agents": 2, "messages_today": 41}),
    );
    transport.respond_ok(
        Verb::Post,
        urls::AGENT_CHAT,
        json!({"data": {"response": "Hi! How can I help?"}}),
    );
    transport.respond_err(
        Verb::Get,
        urls::DASHBOARD_METRICS,
        TransportError::rejected(json!({"status": 503, "data": "metrics backend down"})),
    );
    transport
}

fn transport() -> anyhow::Result<Arc<dyn Transport>> {
    if std::env::var("KEYSLOT_BASE_URL").is_ok() {
        let config = HttpTransportConfig::from_env()?;
        tracing::info!(base_url = %config.base_url, "Using HTTP transport");
        Ok(Arc::new(HttpTransport::new(config)?))
    } else {
        tracing::info!("Using scripted transport");
        Ok(Arc::new(scripted_transport()))
    }
}

async fn print_panels(dashboard: &Dashboard<Arc<dyn Transport>>) {
    let lines = dashboard
        .store()
        .state(|s| {
            [keys::AGENTS, keys::AGENT_CHAT_HISTORY, keys::AGENT_CHAT, keys::DASHBOARD_METRICS]
                .iter()
                .map(|key| describe_slot(s, key))
                .collect::<Vec<_>>()
        })
        .await;
    for line in lines {
        println!("  {line}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashboard=debug,keyslot_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut metrics = MetricsServer::new();
    metrics.start()?;

    println!("=== Agent Dashboard ===\n");
    let dashboard = Dashboard::new(transport()?);

    println!(">>> Loading all panels");
    let (agents, history, panel) = dashboard.load_all(AGENT_ID).await;
    for (name, result) in [("agents", agents), ("history", history), ("metrics", panel)] {
        if let Err(e) = result {
            println!("  {name} failed: {e}");
        }
    }
    print_panels(&dashboard).await;

    println!("\n>>> Sending a chat message");
    match dashboard.send_chat(AGENT_ID, "hello there").await {
        Ok(reply) => println!("  reply: {}", reply["data"]["response"]),
        Err(e) => println!("  chat failed: {e}"),
    }

    println!("\n>>> Refreshing metrics");
    if let Err(e) = dashboard.refresh_metrics().await {
        println!("  metrics refresh failed: {e}");
    }
    print_panels(&dashboard).await;

    println!("\n>>> Flat store");
    let flat = dashboard.store().flatten().await;
    println!("{}", serde_json::to_string_pretty(&flat)?);

    if let Some(rendered) = metrics.render() {
        println!("\n>>> Metrics\n{rendered}");
    }

    Ok(())
}
