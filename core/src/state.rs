//! Slot state: one record per logical key.
//!
//! The store holds a `Map<LogicalKey, Slot>`. Readers reconstruct a slot's
//! lifecycle from its `loading` / `error` / `response` triple; there is no
//! separate phase discriminant.

use crate::action::Ticket;
use crate::key::{DerivedField, LogicalKey, Suffix};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The derived fields of one logical key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    /// `true` while a request is in flight.
    pub loading: bool,

    /// `None` reads as `false`; `Some(detail)` is the last failure's detail.
    pub error: Option<Value>,

    /// Payload of the last success, or `None` (reads as `null`).
    pub response: Option<Value>,

    /// Parameters of the last request or overwrite.
    pub params: Value,

    /// Ticket of the latest request that started on this slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            response: None,
            params: Value::Object(Map::new()),
            ticket: None,
        }
    }
}

impl Slot {
    /// Whether the last settlement was a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Value of one derived field, as a flat consumer reads it.
    #[must_use]
    pub fn field(&self, suffix: Suffix) -> Value {
        match suffix {
            Suffix::Loading => Value::Bool(self.loading),
            Suffix::Error => self.error.clone().unwrap_or(Value::Bool(false)),
            Suffix::Response => self.response.clone().unwrap_or(Value::Null),
            Suffix::Params => self.params.clone(),
        }
    }
}

/// The whole store: every slot that has been touched since the last reset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotsState {
    slots: BTreeMap<LogicalKey, Slot>,
}

impl SlotsState {
    /// Empty initial state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// The slot for `key`, if it was ever used.
    #[must_use]
    pub fn slot(&self, key: &LogicalKey) -> Option<&Slot> {
        self.slots.get(key)
    }

    /// Convenience lookup by string key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Slot> {
        self.slots.get(&LogicalKey::new(key))
    }

    /// Slot for `key`, created empty on first use.
    pub fn slot_mut(&mut self, key: LogicalKey) -> &mut Slot {
        self.slots.entry(key).or_default()
    }

    /// Value of one derived field; `None` if the key was never used.
    #[must_use]
    pub fn field(&self, field: &DerivedField) -> Option<Value> {
        self.slots.get(&field.key).map(|slot| slot.field(field.suffix))
    }

    /// `true` while `key` has a request in flight.
    #[must_use]
    pub fn is_loading(&self, key: &str) -> bool {
        self.get(key).is_some_and(|slot| slot.loading)
    }

    /// Last successful payload for `key`.
    #[must_use]
    pub fn response(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(|slot| slot.response.as_ref())
    }

    /// Last failure detail for `key`.
    #[must_use]
    pub fn error(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(|slot| slot.error.as_ref())
    }

    /// Keys that have been used since the last reset.
    pub fn keys(&self) -> impl Iterator<Item = &LogicalKey> {
        self.slots.keys()
    }

    /// Number of slots in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has been used.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Flat view: `"<key><suffix>" -> value` for every field of every slot.
    ///
    /// ```
    /// use keyslot_core::action::SlotAction;
    /// use keyslot_core::fold::fold;
    /// use keyslot_core::state::SlotsState;
    /// use keyslot_core::transport::Verb;
    /// use serde_json::json;
    ///
    /// let state = fold(&SlotsState::new(), SlotAction::request(Verb::Get, Some("AGENTS"), None));
    /// let flat = state.flatten();
    /// assert_eq!(flat["AGENTS.LOADING"], json!(true));
    /// assert_eq!(flat["AGENTS.RESPONSE"], json!(null));
    /// ```
    #[must_use]
    pub fn flatten(&self) -> Map<String, Value> {
        let mut flat = Map::new();
        for (key, slot) in &self.slots {
            for suffix in Suffix::ALL {
                flat.insert(key.field(suffix).flattened(), slot.field(suffix));
            }
        }
        flat
    }
}
