mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{final_uri_for, modified_handle, FakeFreenet};
use proptest::prelude::*;
use sone_core::{InsertOutcome, InserterConfig, SoneError, SoneInserter};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After a successful insert the counter is zero exactly when nobody
    /// edited the Sone while the insert ran.
    #[test]
    fn prop_counter_reset_only_without_concurrent_edits(
        initial in 1u64..1_000,
        concurrent_edits in 0u64..5,
    ) {
        let handle = modified_handle("prop", "prop", initial);
        let edited = Arc::new(AtomicBool::new(false));
        let (freenet, _calls) = {
            let handle = handle.clone();
            let edited = edited.clone();
            FakeFreenet::new(move |call| {
                if !edited.swap(true, Ordering::SeqCst) {
                    for _ in 0..concurrent_edits {
                        handle.modify(|s| s.mark_modified()).unwrap();
                    }
                }
                Ok(final_uri_for(call, 1))
            })
        };
        let mut inserter = SoneInserter::new(handle.clone(), freenet, InserterConfig::default());

        let outcome = inserter.run_once();
        let counter = handle.modification_counter().unwrap();

        match outcome {
            InsertOutcome::Inserted { counter_reset, .. } => {
                prop_assert_eq!(counter_reset, concurrent_edits == 0);
                if concurrent_edits == 0 {
                    prop_assert_eq!(counter, 0);
                } else {
                    prop_assert_eq!(counter, initial + concurrent_edits);
                }
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
    }

    /// A failed insert never touches the counter.
    #[test]
    fn prop_failed_insert_preserves_counter(initial in 1u64..1_000, attempts in 1usize..4) {
        let handle = modified_handle("prop-fail", "prop-fail", initial);
        let (freenet, _calls) = FakeFreenet::new(|_| {
            Err(SoneError::InsertionFailed { reason: "timeout".to_string() })
        });
        let mut inserter = SoneInserter::new(handle.clone(), freenet, InserterConfig::default());

        for _ in 0..attempts {
            let failed = matches!(inserter.run_once(), InsertOutcome::Failed { .. });
            prop_assert!(failed);
        }
        prop_assert_eq!(handle.modification_counter().unwrap(), initial);
        prop_assert_eq!(inserter.consecutive_failures() as usize, attempts);
    }
}
