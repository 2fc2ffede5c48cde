//! Store fold: applies lifecycle actions to [`SlotsState`].
//!
//! Per phase, for the action's key:
//!
//! | Action          | `LOADING` | `ERROR`            | `RESPONSE`     | `PARAMS`        |
//! |-----------------|-----------|--------------------|----------------|-----------------|
//! | Request         | `true`    | `false`            | `null`         | `params ?? {}`  |
//! | Success         | `false`   | `false`            | payload        | unchanged       |
//! | Failure         | `false`   | `detail ?? {}`     | unchanged      | unchanged       |
//! | `UpdateKeyData` | unchanged | unchanged          | payload        | `params ?? {}`  |
//!
//! `Reset` discards every slot. `Unrecognized` leaves the state untouched.
//!
//! # Duplicate in-flight keys
//!
//! Terminal actions are applied in arrival order, so when two requests for
//! the same key overlap, whichever settles last wins. Enable
//! [`SlotReducer::with_generation_guard`] to drop terminal actions whose
//! ticket is older than the slot's latest request instead.

use crate::action::{SlotAction, Ticket};
use crate::reducer::Reducer;
use crate::state::SlotsState;
use serde_json::{json, Value};

/// Reducer for the slot store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotReducer {
    generation_guard: bool,
}

impl SlotReducer {
    /// Reducer with last-write-wins settlement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generation_guard: false,
        }
    }

    /// Reducer that discards terminal actions from superseded requests.
    #[must_use]
    pub const fn with_generation_guard() -> Self {
        Self {
            generation_guard: true,
        }
    }

    /// Whether the generation guard is enabled.
    #[must_use]
    pub const fn generation_guard(&self) -> bool {
        self.generation_guard
    }

    /// Apply `action` to `state` in place.
    pub fn apply(&self, state: &mut SlotsState, action: SlotAction) {
        match action {
            SlotAction::Request {
                key, params, ticket, ..
            } => {
                let slot = state.slot_mut(key);
                slot.loading = true;
                slot.error = None;
                slot.response = None;
                slot.params = params.unwrap_or_else(empty_object);
                slot.ticket = slot.ticket.max(ticket);
            },
            SlotAction::Success {
                key,
                response,
                ticket,
                ..
            } => {
                let slot = state.slot_mut(key);
                if self.is_stale(slot.ticket, ticket) {
                    tracing::debug!(?ticket, latest = ?slot.ticket, "Discarding stale success");
                    return;
                }
                slot.loading = false;
                slot.error = None;
                slot.response = Some(response);
            },
            SlotAction::Failure {
                key, error, ticket, ..
            } => {
                let slot = state.slot_mut(key);
                if self.is_stale(slot.ticket, ticket) {
                    tracing::debug!(?ticket, latest = ?slot.ticket, "Discarding stale failure");
                    return;
                }
                slot.loading = false;
                slot.error = Some(error.unwrap_or_else(empty_object));
            },
            SlotAction::UpdateKeyData {
                key,
                response,
                params,
            } => {
                let slot = state.slot_mut(key);
                slot.response = Some(response);
                slot.params = params.unwrap_or_else(empty_object);
            },
            SlotAction::Reset => state.clear(),
            SlotAction::Unrecognized => {},
        }
    }

    fn is_stale(&self, latest: Option<Ticket>, ticket: Option<Ticket>) -> bool {
        match (latest, ticket) {
            (Some(latest), Some(ticket)) => self.generation_guard && ticket < latest,
            _ => false,
        }
    }
}

impl Reducer for SlotReducer {
    type State = SlotsState;
    type Action = SlotAction;
    type Environment = ();

    fn reduce(&self, state: &mut Self::State, action: Self::Action, _env: &Self::Environment) {
        self.apply(state, action);
    }
}

/// Pure fold: the state after applying `action` to `state`.
///
/// Uses last-write-wins settlement; see [`SlotReducer::with_generation_guard`].
#[must_use]
pub fn fold(state: &SlotsState, action: SlotAction) -> SlotsState {
    let mut next = state.clone();
    SlotReducer::new().apply(&mut next, action);
    next
}

fn empty_object() -> Value {
    json!({})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::LogicalKey;
    use crate::transport::Verb;

    fn settled(key: &str, response: Value) -> SlotsState {
        let state = fold(&SlotsState::new(), SlotAction::request(Verb::Get, Some(key), None));
        fold(&state, SlotAction::success(Verb::Get, Some(key), response))
    }

    #[test]
    fn request_marks_loading_and_clears_terminal_fields() {
        let state = settled("AGENTS", json!({"data": []}));
        let state = fold(&state, SlotAction::failure(Verb::Get, Some("AGENTS"), None));
        let state = fold(
            &state,
            SlotAction::request(Verb::Get, Some("AGENTS"), Some(json!({"page": 2}))),
        );

        let slot = state.get("AGENTS");
        assert_eq!(slot.map(|s| s.loading), Some(true));
        assert_eq!(slot.and_then(|s| s.error.clone()), None);
        assert_eq!(slot.and_then(|s| s.response.clone()), None);
        assert_eq!(slot.map(|s| s.params.clone()), Some(json!({"page": 2})));
    }

    #[test]
    fn request_without_params_records_empty_object() {
        let state = fold(&SlotsState::new(), SlotAction::request(Verb::Post, Some("A"), None));
        assert_eq!(state.get("A").map(|s| s.params.clone()), Some(json!({})));
    }

    #[test]
    fn terminal_action_on_unused_key_records_empty_params() {
        let state = fold(&SlotsState::new(), SlotAction::success(Verb::Get, Some("A"), json!(1)));
        let state = fold(&state, SlotAction::failure(Verb::Get, Some("B"), None));

        let flat = state.flatten();
        assert_eq!(flat["A.PARAMS"], json!({}));
        assert_eq!(flat["B.PARAMS"], json!({}));
    }

    #[test]
    fn success_stores_payload() {
        let state = settled("AGENTS", json!({"data": [{"id": "1"}]}));
        assert!(!state.is_loading("AGENTS"));
        assert!(state.error("AGENTS").is_none());
        assert_eq!(state.response("AGENTS"), Some(&json!({"data": [{"id": "1"}]})));
    }

    #[test]
    fn failure_keeps_previous_response() {
        let state = settled("AGENTS", json!([1, 2]));
        let state = fold(
            &state,
            SlotAction::failure(Verb::Get, Some("AGENTS"), Some(json!({"status": 503}))),
        );
        assert_eq!(state.response("AGENTS"), Some(&json!([1, 2])));
        assert_eq!(state.error("AGENTS"), Some(&json!({"status": 503})));
        assert!(!state.is_loading("AGENTS"));
    }

    #[test]
    fn failure_without_detail_records_empty_marker() {
        let state = fold(&SlotsState::new(), SlotAction::request(Verb::Get, Some("A"), None));
        let state = fold(&state, SlotAction::failure(Verb::Get, Some("A"), None));
        assert_eq!(state.error("A"), Some(&json!({})));
    }

    #[test]
    fn update_key_data_writes_response_and_params_only() {
        let state = fold(&SlotsState::new(), SlotAction::request(Verb::Get, Some("A"), None));
        let state = fold(
            &state,
            SlotAction::update_key_data(Some("A"), json!({"seeded": true}), Some(json!({"q": 1}))),
        );
        let slot = state.get("A");
        assert_eq!(slot.map(|s| s.loading), Some(true));
        assert_eq!(slot.and_then(|s| s.response.clone()), Some(json!({"seeded": true})));
        assert_eq!(slot.map(|s| s.params.clone()), Some(json!({"q": 1})));
    }

    #[test]
    fn reset_discards_every_slot() {
        let state = settled("A", json!(1));
        let state = fold(&state, SlotAction::request(Verb::Get, Some("B"), None));
        let state = fold(&state, SlotAction::reset());
        assert_eq!(state, SlotsState::new());
    }

    #[test]
    fn unrecognized_action_is_a_no_op() {
        let state = settled("A", json!(1));
        assert_eq!(fold(&state, SlotAction::Unrecognized), state);
    }

    #[test]
    fn last_settlement_wins_without_guard() {
        let first = Ticket::new(1);
        let second = Ticket::new(2);
        let mut state = SlotsState::new();
        let reducer = SlotReducer::new();

        reducer.apply(&mut state, SlotAction::request(Verb::Get, Some("A"), None).with_ticket(first));
        reducer.apply(&mut state, SlotAction::request(Verb::Get, Some("A"), None).with_ticket(second));
        reducer.apply(&mut state, SlotAction::success(Verb::Get, Some("A"), json!("new")).with_ticket(second));
        reducer.apply(&mut state, SlotAction::failure(Verb::Get, Some("A"), None).with_ticket(first));

        assert_eq!(state.error("A"), Some(&json!({})));
        assert_eq!(state.response("A"), Some(&json!("new")));
    }

    #[test]
    fn generation_guard_discards_stale_terminal_actions() {
        let first = Ticket::new(1);
        let second = Ticket::new(2);
        let mut state = SlotsState::new();
        let reducer = SlotReducer::with_generation_guard();

        reducer.apply(&mut state, SlotAction::request(Verb::Get, Some("A"), None).with_ticket(first));
        reducer.apply(&mut state, SlotAction::request(Verb::Get, Some("A"), None).with_ticket(second));
        reducer.apply(&mut state, SlotAction::success(Verb::Get, Some("A"), json!("new")).with_ticket(second));
        reducer.apply(&mut state, SlotAction::failure(Verb::Get, Some("A"), None).with_ticket(first));

        assert!(state.error("A").is_none());
        assert_eq!(state.response("A"), Some(&json!("new")));
        assert_eq!(state.get("A").and_then(|s| s.ticket), Some(second));
    }

    #[test]
    fn reduce_matches_pure_fold() {
        let action = SlotAction::request(Verb::Get, Some("A"), None);
        let mut state = SlotsState::new();
        SlotReducer::new().reduce(&mut state, action.clone(), &());
        assert_eq!(state, fold(&SlotsState::new(), action));
        assert!(state.slot(&LogicalKey::new("A")).is_some());
    }
}
