//! # Keyslot Testing
//!
//! Testing utilities for keyed async-state slots.
//!
//! This crate provides:
//! - [`MockTransport`]: scripted responses with caller-controlled settlement order
//! - [`RecordingDispatcher`]: a dispatch sink that keeps every action it receives
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`properties`]: proptest strategies for keys, payloads and actions
//!
//! ## Example
//!
//! ```ignore
//! use keyslot_testing::MockTransport;
//! use keyslot_runtime::{Orchestrator, SlotStore};
//!
//! #[tokio::test]
//! async fn agents_load() {
//!     let transport = MockTransport::new();
//!     let gate = transport.gate(Verb::Get, "/agents");
//!
//!     let store = SlotStore::slots();
//!     let orchestrator = Orchestrator::new(store.clone(), transport.clone());
//!     let call = orchestrator.spawn(Verb::Get, "/agents", json!({}), None, Some("AGENTS"));
//!
//!     transport.wait_for_calls(1).await;
//!     assert!(store.state(|s| s.is_loading("AGENTS")).await);
//!
//!     gate.resolve(json!({"data": []}));
//!     call.await??;
//! }
//! ```


pub use reducer_test::ReducerTest;

/// Mock implementations of the transport and dispatch contracts.
pub mod mocks {
    use keyslot_core::action::SlotAction;
    use keyslot_core::dispatch::{Dispatch, DispatchFuture};
    use keyslot_core::fold::SlotReducer;
    use keyslot_core::state::SlotsState;
    use keyslot_core::transport::{RequestOptions, Transport, TransportError, TransportFuture, Verb};
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use tokio::sync::{oneshot, Notify};

    type Outcome = Result<Value, TransportError>;

    /// One scripted answer.
    enum Scripted {
        Ready(Outcome),
        Gated(oneshot::Receiver<Outcome>),
    }

    /// A call the mock received.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        /// Verb used.
        pub verb: Verb,
        /// URL as passed by the caller.
        pub url: String,
        /// Body (`null` for `GET`).
        pub body: Value,
        /// Options as passed by the caller.
        pub options: RequestOptions,
    }

    #[derive(Default)]
    struct Inner {
        scripts: HashMap<(Verb, String), VecDeque<Scripted>>,
        calls: Vec<RecordedCall>,
    }

    /// Transport with scripted answers.
    ///
    /// Answers are queued per `(verb, url)` and consumed in call order. A
    /// [`Gate`] holds its call open until the test settles it, so tests pick
    /// the order in which concurrent calls complete. Calls with nothing
    /// scripted fail with [`TransportError::Connection`].
    ///
    /// Clones share scripts and the call log.
    #[derive(Clone, Default)]
    pub struct MockTransport {
        inner: Arc<Mutex<Inner>>,
        called: Arc<Notify>,
    }

    impl MockTransport {
        /// Transport with nothing scripted.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, Inner> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn push(&self, verb: Verb, url: &str, scripted: Scripted) {
            self.lock()
                .scripts
                .entry((verb, url.to_string()))
                .or_default()
                .push_back(scripted);
        }

        /// Queue an immediate answer for the next `verb url` call.
        pub fn respond(&self, verb: Verb, url: &str, outcome: Result<Value, TransportError>) {
            self.push(verb, url, Scripted::Ready(outcome));
        }

        /// Queue an immediate success.
        pub fn respond_ok(&self, verb: Verb, url: &str, response: Value) {
            self.respond(verb, url, Ok(response));
        }

        /// Queue an immediate failure.
        pub fn respond_err(&self, verb: Verb, url: &str, error: TransportError) {
            self.respond(verb, url, Err(error));
        }

        /// Queue an answer that is held until the returned [`Gate`] settles.
        #[must_use]
        pub fn gate(&self, verb: Verb, url: &str) -> Gate {
            let (tx, rx) = oneshot::channel();
            self.push(verb, url, Scripted::Gated(rx));
            Gate { tx }
        }

        /// Every call received so far, in arrival order.
        #[must_use]
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.lock().calls.clone()
        }

        /// Number of calls received so far.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.lock().calls.len()
        }

        /// Wait until at least `count` calls have been received.
        pub async fn wait_for_calls(&self, count: usize) {
            loop {
                let notified = self.called.notified();
                if self.call_count() >= count {
                    return;
                }
                notified.await;
            }
        }

        fn answer(&self, verb: Verb, url: &str, body: Value, options: RequestOptions) -> TransportFuture<'_> {
            let scripted = {
                let mut inner = self.lock();
                inner.calls.push(RecordedCall {
                    verb,
                    url: url.to_string(),
                    body,
                    options,
                });
                inner
                    .scripts
                    .get_mut(&(verb, url.to_string()))
                    .and_then(VecDeque::pop_front)
            };
            self.called.notify_waiters();

            let missing = format!("no response scripted for {verb} {url}");
            Box::pin(async move {
                match scripted {
                    Some(Scripted::Ready(outcome)) => outcome,
                    Some(Scripted::Gated(rx)) => rx
                        .await
                        .unwrap_or_else(|_| Err(TransportError::Connection("gate dropped".to_string()))),
                    None => Err(TransportError::Connection(missing)),
                }
            })
        }
    }

    impl Transport for MockTransport {
        fn get<'a>(&'a self, url: &'a str, options: RequestOptions) -> TransportFuture<'a> {
            self.answer(Verb::Get, url, Value::Null, options)
        }

        fn post<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
            self.answer(Verb::Post, url, body, options)
        }

        fn put<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
            self.answer(Verb::Put, url, body, options)
        }

        fn patch<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
            self.answer(Verb::Patch, url, body, options)
        }

        fn delete<'a>(&'a self, url: &'a str, body: Value, options: RequestOptions) -> TransportFuture<'a> {
            self.answer(Verb::Delete, url, body, options)
        }
    }

    /// Settles one gated call. Dropping it fails the call with
    /// [`TransportError::Connection`].
    #[derive(Debug)]
    pub struct Gate {
        tx: oneshot::Sender<Outcome>,
    }

    impl Gate {
        /// Settle the call successfully.
        pub fn resolve(self, response: Value) {
            let _ = self.tx.send(Ok(response));
        }

        /// Settle the call with `error`.
        pub fn reject(self, error: TransportError) {
            let _ = self.tx.send(Err(error));
        }
    }

    /// Dispatch sink that records every action and folds it into its own state.
    #[derive(Clone, Default)]
    pub struct RecordingDispatcher {
        inner: Arc<Mutex<(Vec<SlotAction>, SlotsState)>>,
        reducer: SlotReducer,
    }

    impl RecordingDispatcher {
        /// Empty recorder folding with last-write-wins settlement.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Empty recorder folding with `reducer`.
        #[must_use]
        pub fn with_reducer(reducer: SlotReducer) -> Self {
            Self {
                reducer,
                ..Self::default()
            }
        }

        fn lock(&self) -> MutexGuard<'_, (Vec<SlotAction>, SlotsState)> {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Every action received, in order.
        #[must_use]
        pub fn actions(&self) -> Vec<SlotAction> {
            self.lock().0.clone()
        }

        /// State after folding every received action.
        #[must_use]
        pub fn state(&self) -> SlotsState {
            self.lock().1.clone()
        }
    }

    impl Dispatch<SlotAction> for RecordingDispatcher {
        fn dispatch(&self, action: SlotAction) -> DispatchFuture<'_> {
            {
                let mut guard = self.lock();
                let (actions, state) = &mut *guard;
                self.reducer.apply(state, action.clone());
                actions.push(action);
            }
            Box::pin(async {})
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use tracing_subscriber::EnvFilter;

    /// Route `tracing` output to the test harness.
    ///
    /// Honors `RUST_LOG`; safe to call from every test.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| "keyslot_runtime=debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use keyslot_core::action::SlotAction;
    use keyslot_core::fold::fold;
    use keyslot_core::key::LogicalKey;
    use keyslot_core::state::SlotsState;
    use keyslot_core::transport::Verb;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// Any verb.
    pub fn arb_verb() -> impl Strategy<Value = Verb> {
        prop::sample::select(Verb::ALL.to_vec())
    }

    /// Upper-case keys in the style callers use (`AGENTS`, `CHAT_HISTORY_3`).
    pub fn arb_key() -> impl Strategy<Value = LogicalKey> {
        "[A-Z][A-Z0-9_]{0,11}".prop_map(LogicalKey::new)
    }

    /// Small JSON payloads.
    pub fn arb_payload() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
            prop::collection::vec(any::<u8>(), 0..4).prop_map(|v| json!(v)),
            (any::<u16>(), "[a-z]{0,6}").prop_map(|(status, data)| json!({"status": status, "data": data})),
        ]
    }

    /// A key-bearing action for `key`: request, success, failure or overwrite.
    pub fn arb_action_for(key: LogicalKey) -> impl Strategy<Value = SlotAction> {
        let name = key.into_inner();
        (
            0..4u8,
            arb_verb(),
            proptest::option::of(arb_payload()),
            arb_payload(),
        )
            .prop_map(move |(kind, verb, maybe, payload)| {
                let key = Some(name.as_str());
                match kind {
                    0 => SlotAction::request(verb, key, maybe),
                    1 => SlotAction::success(verb, key, payload),
                    2 => SlotAction::failure(verb, key, maybe),
                    _ => SlotAction::update_key_data(key, payload, maybe),
                }
            })
    }

    /// Any action, including reset and unrecognized.
    pub fn arb_action() -> impl Strategy<Value = SlotAction> {
        prop_oneof![
            8 => arb_key().prop_flat_map(arb_action_for),
            1 => Just(SlotAction::reset()),
            1 => Just(SlotAction::Unrecognized),
        ]
    }

    /// A state reached by folding a random action sequence.
    pub fn arb_state() -> impl Strategy<Value = SlotsState> {
        prop::collection::vec(arb_action(), 0..16)
            .prop_map(|actions| actions.into_iter().fold(SlotsState::new(), |s, a| fold(&s, a)))
    }
}

// Re-export commonly used items
pub use mocks::{Gate, MockTransport, RecordedCall, RecordingDispatcher};
