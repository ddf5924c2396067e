//! Debug assertion macros for bounded buffer invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.
//!
//! Used by `BoundedBuffer`, `Producer` and `ShutdownState`.

// =============================================================================
// INV-BUF-01: Bounded Length
// =============================================================================

/// Assert that the queue length does not exceed capacity.
///
/// **Invariant**: `0 ≤ len ≤ capacity`
///
/// Used in: `Producer::produce()` after pushing
macro_rules! debug_assert_bounded_len {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "INV-BUF-01 violated: len {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-BUF-02: FIFO Pop Order
// =============================================================================

/// Assert that popped values are strictly increasing.
///
/// **Invariant**: the generator is monotonic and the queue is FIFO, so every
/// pop returns a value greater than the previous pop.
///
/// Used in: `BoundedBuffer::consume()` after popping the front item
macro_rules! debug_assert_fifo_pop {
    ($last:expr, $value:expr) => {
        debug_assert!(
            $last.map_or(true, |last: u64| $value > last),
            "INV-BUF-02 violated: popped {} after {:?}",
            $value,
            $last
        )
    };
}

// =============================================================================
// INV-SHUT-01: No Push After Producer Done
// =============================================================================

/// Assert that nothing is pushed once `producer_done` is visible.
///
/// **Invariant**: `producer_done → no further push`
///
/// Used in: `Producer::produce()` before pushing
macro_rules! debug_assert_no_push_after_done {
    ($producer_done:expr) => {
        debug_assert!(
            !$producer_done,
            "INV-SHUT-01 violated: push attempted after producer_done was set"
        )
    };
}

// =============================================================================
// INV-SHUT-02: Drain Before Done
// =============================================================================

/// Assert that the terminal outcome is only handed out on an empty, fully
/// stopped buffer.
///
/// **Invariant**: `Done → empty ∧ stopping ∧ producer_done`
///
/// Used in: `BoundedBuffer::consume()` on the terminal path
macro_rules! debug_assert_drained_before_done {
    ($len:expr, $stopping:expr, $producer_done:expr) => {
        debug_assert!(
            $len == 0 && $stopping && $producer_done,
            "INV-SHUT-02 violated: done with len {} (stopping: {}, producer_done: {})",
            $len,
            $stopping,
            $producer_done
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_len;
pub(crate) use debug_assert_drained_before_done;
pub(crate) use debug_assert_fifo_pop;
pub(crate) use debug_assert_no_push_after_done;
