//! Error types for drainq.
//!
//! Buffer operations themselves never fail: shutdown is reported through
//! return values. These errors cover construction and orchestration.

use std::io;
use thiserror::Error;

/// Errors raised while building a buffer or taking its producer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// A buffer must hold at least one item.
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    /// The single producer handle has already been handed out.
    #[error("producer handle already taken")]
    ProducerTaken,
}

/// Errors raised while wiring up or tearing down a pipeline.
#[derive(Debug, Error)]
pub enum DrainqError {
    /// Invalid buffer configuration or producer registration.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Installing the interrupt handler failed.
    #[error("failed to register signal handler: {0}")]
    Signal(#[from] io::Error),

    /// The OS refused to spawn a task thread.
    #[error("failed to spawn {task} thread: {source}")]
    Spawn {
        /// Name of the task that could not be started.
        task: String,
        /// Underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// A task panicked before it could report back.
    #[error("{task} thread panicked")]
    TaskPanicked {
        /// Name of the task that panicked.
        task: String,
    },

    /// A pipeline needs at least one consumer to drain the buffer.
    #[error("pipeline requires at least one consumer")]
    NoConsumers,
}

impl DrainqError {
    /// Returns `true` if the error came from a task that started and then died.
    #[inline]
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskPanicked { .. })
    }
}
