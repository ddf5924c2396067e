//! Two-flag shutdown handshake shared by every task.

use crossbeam_utils::CachePadded;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

// =============================================================================
// HANDSHAKE PROTOCOL
// =============================================================================
//
// `stopping`      set once by the watcher: no further pushes are accepted.
// `producer_done` set once by the producer handle, after its last push.
//
// Consumers may only terminate when the queue is empty AND both flags hold.
// Both flags are read outside the buffer lock as wait predicates, so they use
// SeqCst and are padded onto separate cache lines (one writer each).
//
// =============================================================================

/// Shared shutdown flags.
///
/// Both flags transition `false -> true` at most once and are never reset.
#[derive(Default)]
pub struct ShutdownState {
    stopping: CachePadded<AtomicBool>,
    producer_done: CachePadded<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stops accepting new work.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// later calls are no-ops.
    #[inline]
    pub fn request_stop(&self) -> bool {
        !self.stopping.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` once a stop has been requested.
    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Records that the producer will never push again.
    ///
    /// Only the producer handle calls this, after its final push. Returns
    /// `true` for the call that performed the transition.
    #[inline]
    pub(crate) fn mark_producer_done(&self) -> bool {
        !self.producer_done.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` once the producer has permanently exited.
    #[inline]
    pub fn is_producer_done(&self) -> bool {
        self.producer_done.load(Ordering::SeqCst)
    }

    /// Returns `true` when no item can ever be pushed again.
    #[inline]
    pub fn is_drain_complete(&self) -> bool {
        self.is_stopping() && self.is_producer_done()
    }
}

impl fmt::Debug for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownState")
            .field("stopping", &self.is_stopping())
            .field("producer_done", &self.is_producer_done())
            .finish()
    }
}

/// Observable stage of the shutdown sequence.
///
/// `RUNNING → STOPPING → DRAINING → DRAINED`. The watcher's "signal observed"
/// step is folded into the `RUNNING → STOPPING` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownPhase {
    /// No flag set.
    Running,
    /// Stop requested; the producer may still be finishing its last push.
    Stopping,
    /// Producer done; items remain for consumers.
    Draining,
    /// Producer done and queue empty; consumers receive `Done`.
    Drained,
}

impl ShutdownPhase {
    /// Derives the phase from the flags and the current queue length.
    pub fn from_flags(stopping: bool, producer_done: bool, len: usize) -> Self {
        match (stopping, producer_done) {
            (false, _) => Self::Running,
            (true, false) => Self::Stopping,
            (true, true) if len > 0 => Self::Draining,
            (true, true) => Self::Drained,
        }
    }

    /// Returns `true` once consumers will be told to exit.
    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Drained
    }
}
