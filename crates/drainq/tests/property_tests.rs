//! Property-based tests for the bounded buffer invariants.
//!
//! Operation sequences are checked against a plain `VecDeque` model. Pushes
//! are only issued when the model has room, since a push into a full buffer
//! with nobody consuming would (correctly) wait forever.

use drainq::{BoundedBuffer, BufferConfig, ConsumeOutcome, ShutdownState};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

fn buffer(capacity: usize) -> Arc<BoundedBuffer> {
    let config = BufferConfig::new(capacity).with_wait_timeout(Duration::from_millis(1));
    Arc::new(BoundedBuffer::new(config, Arc::new(ShutdownState::new())).unwrap())
}

// =============================================================================
// Bounded length + FIFO against a model
// "0 ≤ len ≤ capacity", pops return values in push order
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_matches_fifo_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(prop::bool::ANY, 1..40),
    ) {
        let buf = buffer(capacity);
        let mut producer = buf.producer().unwrap();
        let mut model = VecDeque::new();
        let mut next = 0u64;

        for push in ops {
            if push {
                if model.len() < capacity {
                    prop_assert!(producer.produce());
                    model.push_back(next);
                    next += 1;
                }
            } else {
                match buf.consume("prop") {
                    ConsumeOutcome::Delivered(c) => {
                        prop_assert_eq!(Some(c.value), model.pop_front());
                        prop_assert_eq!(c.remaining, model.len());
                    }
                    ConsumeOutcome::EmptyWaiting => prop_assert!(model.is_empty()),
                    ConsumeOutcome::Done => prop_assert!(false, "done without shutdown"),
                }
            }

            prop_assert!(buf.len() <= buf.capacity(),
                "len {} > capacity {}", buf.len(), buf.capacity());
            prop_assert_eq!(buf.len(), model.len());
            prop_assert_eq!(buf.front(), model.front().copied());
        }
    }
}

// =============================================================================
// Sentinel correctness + drain-before-exit
// "Done ⟺ empty ∧ stopping ∧ producer_done"
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_done_only_after_full_drain(
        capacity in 1usize..8,
        queued in 0usize..8,
        finish_producer in prop::bool::ANY,
    ) {
        let buf = buffer(capacity);
        let mut producer = buf.producer().unwrap();
        let queued = queued.min(capacity);
        for _ in 0..queued {
            prop_assert!(producer.produce());
        }

        buf.shutdown().request_stop();
        prop_assert!(!producer.produce());
        let producer = if finish_producer {
            producer.finish();
            None
        } else {
            Some(producer)
        };

        let mut drained = Vec::new();
        for _ in 0..queued {
            match buf.consume("prop") {
                ConsumeOutcome::Delivered(c) => drained.push(c.value),
                other => prop_assert!(false, "expected an item, got {:?}", other),
            }
        }
        prop_assert_eq!(drained, (0..queued as u64).collect::<Vec<_>>());

        let last = buf.consume("prop");
        if finish_producer {
            prop_assert_eq!(last, ConsumeOutcome::Done);
        } else {
            prop_assert_eq!(last, ConsumeOutcome::EmptyWaiting);
        }
        drop(producer);
        prop_assert_eq!(buf.consume("prop"), ConsumeOutcome::Done);
    }
}

// =============================================================================
// Legacy integer encoding
// =============================================================================

proptest! {
    #[test]
    fn prop_legacy_code_is_remaining_size(queued in 1usize..8) {
        let buf = buffer(8);
        let mut producer = buf.producer().unwrap();
        for _ in 0..queued {
            prop_assert!(producer.produce());
        }

        for expected_remaining in (0..queued).rev() {
            let outcome = buf.consume("prop");
            prop_assert_eq!(outcome.as_legacy_code(), expected_remaining as i64);
        }
    }
}
