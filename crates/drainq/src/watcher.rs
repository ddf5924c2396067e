//! Translates a delivered interrupt into the `stopping` flag.

use crate::{BoundedBuffer, InterruptFlag};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// How a watcher run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// This watcher observed the interrupt and performed the stop transition.
    Interrupted,
    /// `stopping` was already set by someone else.
    StoppedElsewhere,
}

/// Polls an [`InterruptFlag`] and starts the shutdown handshake.
#[derive(Debug)]
pub struct Watcher {
    buffer: Arc<BoundedBuffer>,
    interrupt: InterruptFlag,
    interval: Duration,
}

impl Watcher {
    pub fn new(buffer: Arc<BoundedBuffer>, interrupt: InterruptFlag, interval: Duration) -> Self {
        Self {
            buffer,
            interrupt,
            interval,
        }
    }

    /// Polls until the interrupt arrives or `stopping` is observed.
    ///
    /// Without an interrupt this never returns on its own.
    pub fn run(self) -> WatchOutcome {
        let shutdown = self.buffer.shutdown();

        while !shutdown.is_stopping() {
            if self.interrupt.is_pending() {
                return self.stop();
            }
            thread::sleep(self.interval);
        }

        debug!("watcher exiting, stop already requested");
        WatchOutcome::StoppedElsewhere
    }

    /// Performs the `RUNNING → STOPPING` edge once.
    fn stop(&self) -> WatchOutcome {
        if !self.buffer.shutdown().request_stop() {
            return WatchOutcome::StoppedElsewhere;
        }

        info!(
            buffer_size = self.buffer.len(),
            front = ?self.buffer.front(),
            "received interrupt, stopping"
        );
        self.buffer.notify_all();
        WatchOutcome::Interrupted
    }
}
