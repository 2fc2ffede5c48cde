//! Lifecycle actions and their builders.
//!
//! A [`SlotAction`] is an immutable record of one phase transition for one
//! key. Building an action has no side effects and cannot fail: a missing or
//! empty key is replaced by the verb's default key.
//!
//! # Wire form
//!
//! Actions serialize internally tagged on `"type"`. An unknown tag
//! deserializes to [`SlotAction::Unrecognized`], which folds as a no-op.
//!
//! ```
//! use keyslot_core::action::SlotAction;
//!
//! let action: SlotAction = serde_json::from_str(r#"{"type":"SOMETHING_NEW","key":"A"}"#).unwrap();
//! assert_eq!(action, SlotAction::Unrecognized);
//! ```

use crate::key::LogicalKey;
use crate::transport::{TransportError, Verb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Monotonic request generation drawn by an orchestrator for each `run`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket(u64);

impl Ticket {
    /// Wrap a raw generation number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw generation number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase of a request-driven action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Request started.
    Request,
    /// Request settled successfully.
    Success,
    /// Request settled with an error.
    Failure,
}

impl Phase {
    /// Upper-case phase name, as used in action type tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "REQUEST",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

/// One state transition for the slot store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotAction {
    /// A request for `key` started.
    Request {
        /// Verb being driven.
        verb: Verb,
        /// Target slot.
        key: LogicalKey,
        /// Request parameters to record (defaults to `{}` when folded).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
        /// Generation of the call that emitted this action.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<Ticket>,
    },

    /// The request for `key` settled with `response`.
    Success {
        /// Verb being driven.
        verb: Verb,
        /// Target slot.
        key: LogicalKey,
        /// Payload returned by the transport.
        response: Value,
        /// Generation of the call that emitted this action.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<Ticket>,
    },

    /// The request for `key` failed.
    Failure {
        /// Verb being driven.
        verb: Verb,
        /// Target slot.
        key: LogicalKey,
        /// Structured error detail (defaults to `{}` when folded).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<Value>,
        /// Generation of the call that emitted this action.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket: Option<Ticket>,
    },

    /// Seed or patch a slot without a network round trip.
    UpdateKeyData {
        /// Target slot.
        key: LogicalKey,
        /// Value written to `RESPONSE`.
        response: Value,
        /// Value written to `PARAMS` (defaults to `{}` when folded).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },

    /// Discard every slot.
    Reset,

    /// An action type this version does not know. Folds as a no-op.
    #[serde(other)]
    Unrecognized,
}

impl SlotAction {
    /// Build a request-phase action.
    #[must_use]
    pub fn request(verb: Verb, key: Option<&str>, params: Option<Value>) -> Self {
        Self::Request {
            verb,
            key: LogicalKey::or_default_for(key, verb),
            params,
            ticket: None,
        }
    }

    /// Build a success-phase action.
    #[must_use]
    pub fn success(verb: Verb, key: Option<&str>, response: Value) -> Self {
        Self::Success {
            verb,
            key: LogicalKey::or_default_for(key, verb),
            response,
            ticket: None,
        }
    }

    /// Build a failure-phase action.
    #[must_use]
    pub fn failure(verb: Verb, key: Option<&str>, error: Option<Value>) -> Self {
        Self::Failure {
            verb,
            key: LogicalKey::or_default_for(key, verb),
            error,
            ticket: None,
        }
    }

    /// Build a failure-phase action from a transport error, keeping only its
    /// structured response detail.
    #[must_use]
    pub fn failure_from(verb: Verb, key: Option<&str>, error: &TransportError) -> Self {
        Self::failure(verb, key, error.response().cloned())
    }

    /// Build a manual overwrite.
    #[must_use]
    pub fn update_key_data(key: Option<&str>, response: Value, params: Option<Value>) -> Self {
        let key = match key {
            Some(key) if !key.is_empty() => LogicalKey::new(key),
            _ => LogicalKey::default_selected(),
        };
        Self::UpdateKeyData { key, response, params }
    }

    /// Build a reset.
    #[must_use]
    pub const fn reset() -> Self {
        Self::Reset
    }

    /// Attach a generation ticket. No effect on housekeeping actions.
    #[must_use]
    pub fn with_ticket(mut self, generation: Ticket) -> Self {
        match &mut self {
            Self::Request { ticket, .. }
            | Self::Success { ticket, .. }
            | Self::Failure { ticket, .. } => *ticket = Some(generation),
            Self::UpdateKeyData { .. } | Self::Reset | Self::Unrecognized => {},
        }
        self
    }

    /// Slot this action targets, if any.
    #[must_use]
    pub const fn key(&self) -> Option<&LogicalKey> {
        match self {
            Self::Request { key, .. }
            | Self::Success { key, .. }
            | Self::Failure { key, .. }
            | Self::UpdateKeyData { key, .. } => Some(key),
            Self::Reset | Self::Unrecognized => None,
        }
    }

    /// Verb, for request-driven actions.
    #[must_use]
    pub const fn verb(&self) -> Option<Verb> {
        match self {
            Self::Request { verb, .. } | Self::Success { verb, .. } | Self::Failure { verb, .. } => {
                Some(*verb)
            },
            Self::UpdateKeyData { .. } | Self::Reset | Self::Unrecognized => None,
        }
    }

    /// Phase, for request-driven actions.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::Request { .. } => Some(Phase::Request),
            Self::Success { .. } => Some(Phase::Success),
            Self::Failure { .. } => Some(Phase::Failure),
            Self::UpdateKeyData { .. } | Self::Reset | Self::Unrecognized => None,
        }
    }

    /// Generation ticket, if one was attached.
    #[must_use]
    pub const fn ticket(&self) -> Option<Ticket> {
        match self {
            Self::Request { ticket, .. }
            | Self::Success { ticket, .. }
            | Self::Failure { ticket, .. } => *ticket,
            Self::UpdateKeyData { .. } | Self::Reset | Self::Unrecognized => None,
        }
    }

    /// Whether this is a success or failure for `key`.
    #[must_use]
    pub fn is_terminal_for(&self, key: &LogicalKey) -> bool {
        matches!(self.phase(), Some(Phase::Success | Phase::Failure)) && self.key() == Some(key)
    }

    /// Legacy action type constant, e.g. `GET_REQUEST` or `UPDATE_KEY_DATA`.
    #[must_use]
    pub fn type_tag(&self) -> String {
        match (self.verb(), self.phase()) {
            (Some(verb), Some(phase)) => format!("{}_{}", verb.as_str(), phase.as_str()),
            _ => match self {
                Self::UpdateKeyData { .. } => "UPDATE_KEY_DATA".to_string(),
                Self::Reset => "RESET".to_string(),
                _ => "UNRECOGNIZED".to_string(),
            },
        }
    }
}
