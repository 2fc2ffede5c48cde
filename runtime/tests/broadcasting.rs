//! Integration tests for Store action broadcasting
//!
//! Observers see every folded action in fold order, whichever task sent it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use keyslot_core::action::{Phase, SlotAction};
use keyslot_core::fold::SlotReducer;
use keyslot_core::state::SlotsState;
use keyslot_core::transport::Verb;
use keyslot_runtime::{Orchestrator, SlotStore, Store, StoreConfig, StoreError};
use keyslot_testing::MockTransport;
use serde_json::json;
use std::time::Duration;

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_wait_for_orchestrated_terminal() {
    let transport = MockTransport::new();
    transport.respond_ok(Verb::Get, "/agents", json!({"data": []}));
    let store = SlotStore::slots();
    let orchestrator = Orchestrator::new(store.clone(), transport);
    let mut observer = store.subscribe_actions();

    let _call = orchestrator.spawn(Verb::Get, "/agents", json!({}), None, Some("AGENTS"));
    let terminal = observer
        .wait_for(|a| a.phase() == Some(Phase::Success), Duration::from_secs(2))
        .await
        .unwrap();

    assert_eq!(terminal.key().map(|k| k.as_str()), Some("AGENTS"));
    assert!(!store.state(|s| s.is_loading("AGENTS")).await);
}

#[tokio::test]
async fn test_observers_see_fold_order_across_tasks() {
    let store = SlotStore::slots();
    let mut observer = store.subscribe_actions();

    let senders: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let key = format!("K{i}");
                store.send(SlotAction::request(Verb::Get, Some(&key), None)).await;
                store.send(SlotAction::success(Verb::Get, Some(&key), json!(i))).await;
            })
        })
        .collect();
    for sender in senders {
        sender.await.unwrap();
    }

    let seen = observer.drain();
    assert_eq!(seen.len(), 16);
    for i in 0..8 {
        let key = format!("K{i}");
        let phases: Vec<_> = seen
            .iter()
            .filter(|a| a.key().is_some_and(|k| k.as_str() == key))
            .filter_map(SlotAction::phase)
            .collect();
        assert_eq!(phases, vec![Phase::Request, Phase::Success]);
    }
}

#[tokio::test]
async fn test_multiple_observers_receive_same_actions() {
    let store = SlotStore::slots();
    let mut first = store.subscribe_actions();
    let mut second = store.subscribe_actions();

    store.send(SlotAction::request(Verb::Post, Some("A"), None)).await;
    store.send(SlotAction::reset()).await;

    let seen = first.drain();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen, second.drain());
}

#[tokio::test]
async fn test_wait_for_times_out() {
    let store = Store::with_config(
        SlotsState::new(),
        SlotReducer::new(),
        (),
        StoreConfig::default().with_broadcast_capacity(4),
    );
    let mut observer = store.subscribe_actions();

    store.send(SlotAction::request(Verb::Get, Some("A"), None)).await;
    let result = observer
        .wait_for(|a| a.phase() == Some(Phase::Failure), Duration::from_millis(30))
        .await;
    assert!(matches!(result, Err(StoreError::Timeout)));
}
