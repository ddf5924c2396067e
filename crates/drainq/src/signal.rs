//! Interrupt delivery.
//!
//! The signal handler performs a single atomic store into an [`InterruptFlag`].
//! Everything else (setting `stopping`, waking waiters, logging) happens on the
//! watcher thread, never inside the handler.

use crate::DrainqError;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Asynchronously-set "please shut down" indicator, consumed by the watcher.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    pending: Arc<AtomicBool>,
}

impl InterruptFlag {
    /// Creates a flag that nothing raises yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a flag raised by SIGINT and SIGTERM.
    ///
    /// Handlers stay registered for the lifetime of the process.
    pub fn register_term_signals() -> Result<Self, DrainqError> {
        let interrupt = Self::new();
        for sig in TERM_SIGNALS {
            flag::register(*sig, Arc::clone(&interrupt.pending))?;
        }
        Ok(interrupt)
    }

    /// Returns `true` once an interrupt has been delivered.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Returns a handle that raises this flag from code instead of a signal.
    pub fn trigger(&self) -> ShutdownTrigger {
        ShutdownTrigger {
            pending: Arc::clone(&self.pending),
        }
    }
}

/// A cloneable handle for raising an interrupt programmatically.
///
/// Multiple clones may fire; only the first has any effect on the watcher.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    pending: Arc<AtomicBool>,
}

impl ShutdownTrigger {
    /// Raises the interrupt, exactly as a delivered signal would.
    pub fn fire(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if the interrupt has been raised by any source.
    pub fn is_fired(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_raises_shared_flag() {
        let interrupt = InterruptFlag::new();
        let trigger = interrupt.trigger();
        let clone = trigger.clone();
        assert!(!interrupt.is_pending());

        clone.fire();
        assert!(interrupt.is_pending());
        assert!(trigger.is_fired());

        // idempotent
        trigger.fire();
        assert!(interrupt.is_pending());
    }
}
