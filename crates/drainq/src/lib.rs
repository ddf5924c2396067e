//! drainq - Bounded Producer/Consumer Buffer with Graceful Shutdown
//!
//! A fixed-capacity FIFO shared by one producer and any number of consumers,
//! with a two-flag shutdown handshake that guarantees:
//!
//! - no item is lost: everything pushed is consumed exactly once
//! - no consumer blocks forever: every wait re-checks at least once per timeout
//! - no consumer exits early: the terminal outcome is only returned once the
//!   queue is empty, a stop was requested and the producer has finished
//!
//! # Shutdown sequence
//!
//! 1. An interrupt (SIGINT/SIGTERM) raises an [`InterruptFlag`].
//! 2. The [`Watcher`] sees it, sets `stopping` and wakes every waiter.
//! 3. The producer observes `stopping`, exits its loop and finishes its
//!    [`Producer`] handle, which sets `producer_done`.
//! 4. Consumers drain what is left and then receive [`ConsumeOutcome::Done`].
//!
//! # Example
//!
//! ```
//! use drainq::{BoundedBuffer, BufferConfig, ConsumeOutcome, ShutdownState};
//! use std::sync::Arc;
//!
//! let shutdown = Arc::new(ShutdownState::new());
//! let buffer = Arc::new(BoundedBuffer::new(BufferConfig::new(3), Arc::clone(&shutdown)).unwrap());
//! let mut producer = buffer.producer().unwrap();
//!
//! assert!(producer.produce());
//! assert_eq!(buffer.consume("cons1").value(), Some(0));
//!
//! shutdown.request_stop();
//! assert!(!producer.produce());
//! producer.finish();
//!
//! assert_eq!(buffer.consume("cons1"), ConsumeOutcome::Done);
//! ```

mod buffer;
mod config;
mod error;
mod invariants;
mod pipeline;
mod shutdown;
mod signal;
mod watcher;

pub use buffer::{BoundedBuffer, ConsumeOutcome, Consumption, Producer};
pub use config::{BufferConfig, ConsumerConfig, PipelineConfig};
pub use error::{BufferError, DrainqError};
pub use pipeline::{
    run_consumer, run_producer, ConsumerReport, Pipeline, PipelineHandle, PipelineReport,
};
pub use shutdown::{ShutdownPhase, ShutdownState};
pub use signal::{InterruptFlag, ShutdownTrigger};
pub use watcher::{WatchOutcome, Watcher};
