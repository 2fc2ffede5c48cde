//! Agent dashboard built on keyed slots.
//!
//! Every widget owns one slot:
//!
//! | Widget          | Key                  | Request                         |
//! |-----------------|----------------------|---------------------------------|
//! | Agent list      | `AGENTS`             | `GET /api/agents`               |
//! | Chat history    | `AGENT_CHAT_HISTORY` | `GET /api/chat/history?...`     |
//! | Chat reply      | `AGENT_CHAT`         | `POST /api/chat`                |
//! | System metrics  | `DASHBOARD_METRICS`  | `GET /api/dashboard`            |
//!
//! Widgets read their slot through [`SlotStore::state`]; none of them waits
//! for another.

use keyslot_core::transport::{Transport, TransportError};
use keyslot_runtime::{Orchestrator, SlotStore};
use serde_json::{json, Value};

/// Slot keys used by the dashboard.
pub mod keys {
    /// Agent list.
    pub const AGENTS: &str = "AGENTS";
    /// Chat history of the selected agent.
    pub const AGENT_CHAT_HISTORY: &str = "AGENT_CHAT_HISTORY";
    /// Reply to the last chat message.
    pub const AGENT_CHAT: &str = "AGENT_CHAT";
    /// System metrics panel.
    pub const DASHBOARD_METRICS: &str = "DASHBOARD_METRICS";
}

/// Endpoints used by the dashboard.
pub mod urls {
    /// Agent list.
    pub const AGENTS: &str = "/api/agents";
    /// Paged chat history.
    pub const AGENT_CHAT_HISTORY: &str = "/api/chat/history";
    /// Send a chat message.
    pub const AGENT_CHAT: &str = "/api/chat";
    /// System metrics.
    pub const DASHBOARD_METRICS: &str = "/api/dashboard";
}

/// Chat history page size.
pub const PAGE_SIZE: u32 = 20;

/// Dashboard actions over one store and one transport.
#[derive(Clone)]
pub struct Dashboard<T> {
    store: SlotStore,
    orchestrator: Orchestrator<SlotStore, T>,
}

impl<T: Transport + Clone + 'static> Dashboard<T> {
    /// Dashboard with an empty store.
    #[must_use]
    pub fn new(transport: T) -> Self {
        let store = SlotStore::slots();
        let orchestrator = Orchestrator::new(store.clone(), transport);
        Self { store, orchestrator }
    }

    /// The store every widget reads from.
    #[must_use]
    pub const fn store(&self) -> &SlotStore {
        &self.store
    }

    /// Reload the agent list.
    ///
    /// # Errors
    ///
    /// Returns the transport error; `AGENTS.ERROR` is set as well.
    pub async fn refresh_agents(&self) -> Result<Value, TransportError> {
        self.orchestrator
            .get(urls::AGENTS, json!({}), None, Some(keys::AGENTS))
            .await
    }

    /// Load one page of an agent's chat history.
    ///
    /// # Errors
    ///
    /// Returns the transport error; `AGENT_CHAT_HISTORY.ERROR` is set as well.
    pub async fn load_chat_history(&self, agent_id: &str, page: u32) -> Result<Value, TransportError> {
        let params = json!({"agent_id": agent_id, "page": page, "page_size": PAGE_SIZE});
        self.orchestrator
            .get(
                urls::AGENT_CHAT_HISTORY,
                json!({ "params": params }),
                None,
                Some(keys::AGENT_CHAT_HISTORY),
            )
            .await
    }

    /// Send a chat message and return the agent's reply payload.
    ///
    /// # Errors
    ///
    /// Returns the transport error; `AGENT_CHAT.ERROR` is set as well.
    pub async fn send_chat(&self, agent_id: &str, message: &str) -> Result<Value, TransportError> {
        self.orchestrator
            .post(
                urls::AGENT_CHAT,
                json!({"message": message, "agent_id": agent_id}),
                None,
                Some(keys::AGENT_CHAT),
            )
            .await
    }

    /// Reload the metrics panel.
    ///
    /// # Errors
    ///
    /// Returns the transport error; `DASHBOARD_METRICS.ERROR` is set as well.
    pub async fn refresh_metrics(&self) -> Result<Value, TransportError> {
        self.orchestrator
            .get(urls::DASHBOARD_METRICS, json!({}), None, Some(keys::DASHBOARD_METRICS))
            .await
    }

    /// Load every panel concurrently.
    ///
    /// Each panel settles independently; the results are returned in
    /// `(agents, history, metrics)` order.
    pub async fn load_all(
        &self,
        agent_id: &str,
    ) -> (
        Result<Value, TransportError>,
        Result<Value, TransportError>,
        Result<Value, TransportError>,
    ) {
        futures::join!(
            self.refresh_agents(),
            self.load_chat_history(agent_id, 1),
            self.refresh_metrics(),
        )
    }
}

/// One line of panel status, as the UI would render it.
#[must_use]
pub fn describe_slot(state: &keyslot_core::state::SlotsState, key: &str) -> String {
    match state.get(key) {
        None => format!("{key}: idle"),
        Some(slot) if slot.loading => format!("{key}: loading"),
        Some(slot) => match (&slot.error, &slot.response) {
            (Some(error), Some(response)) => format!("{key}: stale {response} (error {error})"),
            (Some(error), None) => format!("{key}: error {error}"),
            (None, Some(response)) => format!("{key}: {response}"),
            (None, None) => format!("{key}: empty"),
        },
    }
}
