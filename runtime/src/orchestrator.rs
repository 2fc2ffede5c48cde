//! Per-verb async orchestration.
//!
//! An [`Orchestrator`] drives one request through its lifecycle:
//!
//! 1. Dispatch a request-phase action for the key
//! 2. Await the transport call
//! 3. Dispatch exactly one terminal action: success with the payload, or
//!    failure with the error's structured detail
//!
//! The payload is returned to the caller on success; on failure the original
//! [`TransportError`] is returned after the failure action was dispatched.
//! Both the store and the direct caller see every failure.
//!
//! # Example
//!
//! ```ignore
//! let orchestrator = Orchestrator::new(store.clone(), transport);
//!
//! match orchestrator.get("/agents", json!({}), None, Some("AGENTS")).await {
//!     Ok(agents) => render(agents),
//!     Err(e) => notify(e), // AGENTS.ERROR is already set
//! }
//! ```

use crate::metrics::OrchestratorMetrics;
use keyslot_core::action::{SlotAction, Ticket};
use keyslot_core::dispatch::Dispatch;
use keyslot_core::transport::{RequestOptions, Transport, TransportError, Verb};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Source of request generations, shared by every orchestrator in the process.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

fn next_ticket() -> Ticket {
    Ticket::new(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
}

/// Drives requests through a transport and reports their lifecycle to a
/// dispatch sink.
///
/// # Type Parameters
///
/// - `D`: Dispatch sink, usually a [`SlotStore`](crate::SlotStore)
/// - `T`: Transport client
///
/// Cloning an orchestrator clones its sink and transport handles; clones
/// may run concurrently.
#[derive(Clone, Debug)]
pub struct Orchestrator<D, T> {
    dispatcher: D,
    transport: T,
}

impl<D, T> Orchestrator<D, T>
where
    D: Dispatch<SlotAction>,
    T: Transport,
{
    /// Create an orchestrator over `dispatcher` and `transport`.
    #[must_use]
    pub const fn new(dispatcher: D, transport: T) -> Self {
        Self {
            dispatcher,
            transport,
        }
    }

    /// Dispatch sink this orchestrator reports to.
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Transport this orchestrator calls.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one request for `verb` against `url`, tracked under `key`.
    ///
    /// - `GET`: `data["params"]` is recorded as the slot's `PARAMS` and sent
    ///   as the query unless `options` carries its own.
    /// - Body verbs: `data` is the JSON body; `options.params` is recorded.
    ///
    /// A missing or empty `key` uses the verb's default key.
    ///
    /// Exactly one request action and exactly one terminal action are
    /// dispatched per call. Once the request action is dispatched, the
    /// transport call and the terminal dispatch run on their own task:
    /// dropping the returned future discards the result, not the request.
    ///
    /// # Errors
    ///
    /// Returns the transport's error unchanged, after dispatching the
    /// failure action.
    #[tracing::instrument(skip(self, data, options))]
    pub async fn run(
        &self,
        verb: Verb,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        let ticket = next_ticket();
        let mut options = options.unwrap_or_default();

        let (params, body) = match verb {
            Verb::Get => {
                let params = data.get("params").cloned();
                if options.params.is_none() {
                    options.params.clone_from(&params);
                }
                (params, Value::Null)
            },
            Verb::Post | Verb::Put | Verb::Patch | Verb::Delete => (options.params.clone(), data),
        };

        tracing::debug!(%ticket, "Dispatching request");
        OrchestratorMetrics::record_request(verb);
        self.dispatcher
            .dispatch(SlotAction::request(verb, key, params).with_ticket(ticket))
            .await;

        let orchestrator = self.clone();
        let url = url.to_owned();
        let key = key.map(str::to_owned);
        let settlement = tokio::spawn(
            async move {
                orchestrator
                    .settle(verb, &url, body, options, key.as_deref(), ticket)
                    .await
            }
            .instrument(tracing::Span::current()),
        );

        match settlement.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(TransportError::Connection(e.to_string())),
        }
    }

    /// Await the transport and dispatch the terminal action.
    async fn settle(
        &self,
        verb: Verb,
        url: &str,
        body: Value,
        options: RequestOptions,
        key: Option<&str>,
        ticket: Ticket,
    ) -> Result<Value, TransportError> {
        let start = Instant::now();
        let result = self.transport.call(verb, url, body, options).await;
        OrchestratorMetrics::record_transport(verb, start.elapsed());

        match result {
            Ok(response) => {
                tracing::debug!(%ticket, "Dispatching success");
                self.dispatcher
                    .dispatch(SlotAction::success(verb, key, response.clone()).with_ticket(ticket))
                    .await;
                Ok(response)
            },
            Err(error) => {
                tracing::warn!(%ticket, error = %error, "Request failed");
                OrchestratorMetrics::record_failure(verb);
                self.dispatcher
                    .dispatch(SlotAction::failure_from(verb, key, &error).with_ticket(ticket))
                    .await;
                Err(error)
            },
        }
    }

    /// Run one request on its own task, request dispatch included.
    ///
    /// Awaiting the handle yields what [`Orchestrator::run`] would have
    /// returned.
    pub fn spawn(
        &self,
        verb: Verb,
        url: impl Into<String>,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> JoinHandle<Result<Value, TransportError>>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        let orchestrator = self.clone();
        let url = url.into();
        let key = key.map(str::to_owned);
        tokio::spawn(async move {
            orchestrator
                .run(verb, &url, data, options, key.as_deref())
                .await
        })
    }

    /// `GET url`, tracked under `key`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn get(
        &self,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        self.run(Verb::Get, url, data, options, key).await
    }

    /// `POST url` with `data` as the body, tracked under `key`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn post(
        &self,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        self.run(Verb::Post, url, data, options, key).await
    }

    /// `PUT url` with `data` as the body, tracked under `key`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn put(
        &self,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        self.run(Verb::Put, url, data, options, key).await
    }

    /// `PATCH url` with `data` as the body, tracked under `key`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn patch(
        &self,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        self.run(Verb::Patch, url, data, options, key).await
    }

    /// `DELETE url` with `data` as the body, tracked under `key`.
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::run`].
    pub async fn delete(
        &self,
        url: &str,
        data: Value,
        options: Option<RequestOptions>,
        key: Option<&str>,
    ) -> Result<Value, TransportError>
    where
        D: Clone + 'static,
        T: Clone + 'static,
    {
        self.run(Verb::Delete, url, data, options, key).await
    }
}
