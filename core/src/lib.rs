//! # Keyslot Core
//!
//! Core types for keyed async-state slots.
//!
//! Any number of independent remote-data slots ("agent list", "chat history
//! for agent X", "dashboard metrics") share one state container. Each slot is
//! addressed at runtime by a caller-supplied string key and tracked through
//! its own request lifecycle: pending, then success or failure.
//!
//! ## Core Concepts
//!
//! - **Key Space** ([`key`]): logical keys and the derived fields they address
//! - **Lifecycle Actions** ([`action`]): immutable request/success/failure records,
//!   plus manual overwrite and reset
//! - **Slot State** ([`state`]): `Map<LogicalKey, Slot>`
//! - **Fold** ([`fold`]): the reducer that applies actions to the state
//! - **Transport** ([`transport`]): the network contract orchestrators consume
//! - **Dispatch** ([`dispatch`]): the sink orchestrators deliver actions to
//!
//! ## Example
//!
//! ```
//! use keyslot_core::action::SlotAction;
//! use keyslot_core::fold::fold;
//! use keyslot_core::state::SlotsState;
//! use keyslot_core::transport::Verb;
//! use serde_json::json;
//!
//! let state = SlotsState::new();
//! let state = fold(&state, SlotAction::request(Verb::Get, Some("AGENTS"), None));
//! assert!(state.is_loading("AGENTS"));
//!
//! let state = fold(&state, SlotAction::success(Verb::Get, Some("AGENTS"), json!([])));
//! assert!(!state.is_loading("AGENTS"));
//! assert_eq!(state.response("AGENTS"), Some(&json!([])));
//! ```

// Re-export commonly used types
pub use serde::{Deserialize, Serialize};

pub mod action;
pub mod fold;
pub mod key;
pub mod state;
pub mod transport;

/// Reducer module - the core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → State`.
/// They are deterministic and testable without a runtime.
pub mod reducer {
    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for SlotReducer {
    ///     type State = SlotsState;
    ///     type Action = SlotAction;
    ///     type Environment = ();
    ///
    ///     fn reduce(&self, state: &mut SlotsState, action: SlotAction, _env: &()) {
    ///         self.apply(state, action);
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Apply one action to `state` in place
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment);
    }
}

/// Dispatch module - the sink lifecycle actions are delivered to
///
/// Orchestrators depend only on this trait, never on a concrete store.
pub mod dispatch {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future returned by [`Dispatch::dispatch`].
    pub type DispatchFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// A single-argument action sink.
    ///
    /// The future completes once the action has been folded; readers that
    /// look at the state afterwards observe its effect.
    pub trait Dispatch<A>: Send + Sync {
        /// Deliver one action.
        fn dispatch(&self, action: A) -> DispatchFuture<'_>;
    }

    impl<A, D: Dispatch<A> + ?Sized> Dispatch<A> for std::sync::Arc<D> {
        fn dispatch(&self, action: A) -> DispatchFuture<'_> {
            (**self).dispatch(action)
        }
    }
}
