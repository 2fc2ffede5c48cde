//! # Keyslot Runtime
//!
//! Runtime for keyed async-state slots.
//!
//! ## Core Components
//!
//! - **Store**: owns the single state value and folds actions into it
//! - **Orchestrator**: per-verb `emit request → await transport → emit terminal`
//! - **Action Observer**: watches folded actions (settlement, tests)
//!
//! ## Example
//!
//! ```ignore
//! use keyslot_runtime::{Orchestrator, SlotStore};
//!
//! let store = SlotStore::slots();
//! let orchestrator = Orchestrator::new(store.clone(), transport);
//!
//! let agents = orchestrator.get("/agents", json!({}), None, Some("AGENTS")).await?;
//!
//! // Any other reader sees the settled slot
//! let loading = store.state(|s| s.is_loading("AGENTS")).await;
//! ```

use keyslot_core::reducer::Reducer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-verb async orchestration of slot requests
pub mod orchestrator;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur while observing a Store
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Timeout waiting for a matching action
        ///
        /// Returned by [`ActionObserver::wait_for`](crate::ActionObserver::wait_for)
        /// when the timeout expires before a matching action is folded.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        ///
        /// Every handle to the store was dropped.
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use keyslot_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_broadcast_capacity(256);
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of folded actions buffered for slow observers
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(broadcast_capacity: usize) -> Self {
        Self { broadcast_capacity }
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
        }
    }
}

/// Observer of folded actions
///
/// Created by [`Store::subscribe_actions`]. Every action folded after the observer was
/// created is delivered in fold order.
pub struct ActionObserver<A> {
    rx: tokio::sync::broadcast::Receiver<A>,
}

impl<A: Clone> ActionObserver<A> {
    /// Wait for the next folded action matching `predicate`
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: no matching action before `timeout`
    /// - [`StoreError::ChannelClosed`]: every store handle was dropped
    pub async fn wait_for<F>(&mut self, predicate: F, timeout: Duration) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        use tokio::sync::broadcast::error::RecvError;

        tokio::time::timeout(timeout, async {
            loop {
                match self.rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(RecvError::Lagged(skipped)) => {
                        // If the matching action was dropped, the timeout catches it
                        tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                    },
                    Err(RecvError::Closed) => return Err(StoreError::ChannelClosed),
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Drain every action already folded, without waiting
    pub fn drain(&mut self) -> Vec<A> {
        let mut actions = Vec::new();
        while let Ok(action) = self.rx.try_recv() {
            actions.push(action);
        }
        actions
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{ActionObserver, Arc, Reducer, RwLock, StoreConfig};
    use keyslot_core::dispatch::{Dispatch, DispatchFuture};
    use tokio::sync::broadcast;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the reducer is its only writer)
    /// 2. Reducer (state transitions)
    /// 3. Environment (injected dependencies)
    /// 4. Action broadcast (every folded action, in fold order)
    ///
    /// Readers never observe a partially applied action: the reducer runs
    /// to completion under the write lock.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        /// Every folded action, in fold order.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Broadcasts the action to observers
        ///
        /// State changes are visible as soon as `send` returns.
        ///
        /// # Panics
        ///
        /// If the reducer panics, the panic propagates. Reducers should be
        /// pure functions that do not panic.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) {
            tracing::debug!("Processing action");

            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");

            let start = std::time::Instant::now();
            let observed = action.clone();
            self.reducer.reduce(&mut *state, action, &self.environment);
            crate::metrics::StoreMetrics::record_action(start.elapsed());

            // Broadcast while holding the lock so observers see fold order
            let _ = self.action_broadcast.send(observed);
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loading = store.state(|s| s.is_loading("AGENTS")).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Clone of the current state
        pub async fn snapshot(&self) -> S
        where
            S: Clone,
        {
            self.state(Clone::clone).await
        }

        /// Observe every action folded from now on
        #[must_use]
        pub fn subscribe_actions(&self) -> ActionObserver<A> {
            ActionObserver {
                rx: self.action_broadcast.subscribe(),
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }

    impl<S, A, E, R> Dispatch<A> for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        fn dispatch(&self, action: A) -> DispatchFuture<'_> {
            Box::pin(self.send(action))
        }
    }
}

/// Slot store specializations
pub mod slots {
    use super::store::Store;
    use keyslot_core::action::SlotAction;
    use keyslot_core::fold::SlotReducer;
    use keyslot_core::state::{Slot, SlotsState};
    use serde_json::{Map, Value};

    /// Store over [`SlotsState`] folded by [`SlotReducer`]
    pub type SlotStore = Store<SlotsState, SlotAction, (), SlotReducer>;

    impl Store<SlotsState, SlotAction, (), SlotReducer> {
        /// Empty slot store with last-write-wins settlement
        #[must_use]
        pub fn slots() -> Self {
            Self::new(SlotsState::new(), SlotReducer::new(), ())
        }

        /// Empty slot store that discards stale terminal actions
        #[must_use]
        pub fn slots_with_generation_guard() -> Self {
            Self::new(SlotsState::new(), SlotReducer::with_generation_guard(), ())
        }

        /// Copy of one slot, if the key was ever used
        pub async fn slot(&self, key: &str) -> Option<Slot> {
            self.state(|s| s.get(key).cloned()).await
        }

        /// Flat `"<key><suffix>" -> value` view of the whole store
        pub async fn flatten(&self) -> Map<String, Value> {
            self.state(SlotsState::flatten).await
        }

        /// Discard every slot
        pub async fn reset(&self) {
            self.send(SlotAction::reset()).await;
        }
    }
}

// Re-export for convenience
pub use orchestrator::Orchestrator;
pub use slots::SlotStore;
pub use store::Store;
