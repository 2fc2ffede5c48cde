//! The store applies actions exactly like the pure fold

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use keyslot_core::fold::fold;
use keyslot_core::state::SlotsState;
use keyslot_runtime::SlotStore;
use keyslot_testing::properties::arb_action;
use proptest::prelude::*;

proptest! {
    #[test]
    fn store_matches_pure_fold(actions in prop::collection::vec(arb_action(), 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let expected = actions
            .iter()
            .cloned()
            .fold(SlotsState::new(), |state, action| fold(&state, action));

        let actual = runtime.block_on(async {
            let store = SlotStore::slots();
            for action in actions {
                store.send(action).await;
            }
            store.snapshot().await
        });

        prop_assert_eq!(&actual.flatten(), &expected.flatten());
        prop_assert_eq!(actual, expected);
    }
}
