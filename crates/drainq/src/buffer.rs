#[cfg(debug_assertions)]
use crate::invariants::debug_assert_fifo_pop;
use crate::invariants::{
    debug_assert_bounded_len, debug_assert_drained_before_done, debug_assert_no_push_after_done,
};
use crate::{BufferConfig, BufferError, ShutdownPhase, ShutdownState};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

// =============================================================================
// SYNCHRONIZATION STRATEGY
// =============================================================================
//
// One mutex guards the queue. Every push, pop and inspection happens under it.
//
// Two condition variables split the wakeups:
// - `not_full`  producer parks here; consumers `notify_all` after a pop
// - `not_empty` consumers park here; the producer `notify_one` after a push
//
// Every wait is `wait_timeout_while`: the predicate is re-evaluated on each
// wake and at least once per `wait_timeout`. A notification that races ahead
// of a waiter therefore costs one interval at most, never a permanent park.
//
// The shutdown flags are atomics read inside the predicates. They are written
// outside the lock, so `notify_all()` passes through the lock before waking
// anyone: a waiter that evaluated its predicate before the flag flipped is
// guaranteed to be parked by the time the wakeup is sent.
//
// The generator counter lives in the single `Producer` handle and is never
// shared.
//
// =============================================================================

/// Fixed-capacity FIFO of `u64` items gated by a shared [`ShutdownState`].
///
/// Items are pushed through the single [`Producer`] handle and removed with
/// [`consume`](Self::consume) from any number of threads.
pub struct BoundedBuffer {
    queue: Mutex<Queue>,
    not_full: Condvar,
    not_empty: Condvar,
    config: BufferConfig,
    shutdown: Arc<ShutdownState>,
    producer_taken: AtomicBool,
}

struct Queue {
    items: VecDeque<u64>,
    /// Last popped value, for FIFO verification (debug only)
    #[cfg(debug_assertions)]
    last_popped: Option<u64>,
}

impl BoundedBuffer {
    /// Creates an empty buffer wired to `shutdown`.
    pub fn new(config: BufferConfig, shutdown: Arc<ShutdownState>) -> Result<Self, BufferError> {
        if config.capacity == 0 {
            return Err(BufferError::ZeroCapacity);
        }

        Ok(Self {
            queue: Mutex::new(Queue {
                items: VecDeque::with_capacity(config.capacity),
                #[cfg(debug_assertions)]
                last_popped: None,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            config,
            shutdown,
            producer_taken: AtomicBool::new(false),
        })
    }

    /// Takes the producer handle. Succeeds once per buffer.
    pub fn producer(self: &Arc<Self>) -> Result<Producer, BufferError> {
        if self.producer_taken.swap(true, Ordering::SeqCst) {
            return Err(BufferError::ProducerTaken);
        }

        Ok(Producer {
            buffer: Arc::clone(self),
            next_value: 0,
        })
    }

    /// Removes the front item, waiting up to one `wait_timeout` for data.
    ///
    /// - [`ConsumeOutcome::Delivered`]: an item was popped; waiting producers
    ///   are woken and a consumption event is logged.
    /// - [`ConsumeOutcome::EmptyWaiting`]: nothing to take yet; poll again.
    /// - [`ConsumeOutcome::Done`]: the queue is empty, stop was requested and
    ///   the producer has finished. No item will ever arrive again.
    pub fn consume(&self, name: &str) -> ConsumeOutcome {
        let queue = self.lock();
        let (mut queue, _) = self
            .not_empty
            .wait_timeout_while(queue, self.config.wait_timeout, |q| {
                q.items.is_empty() && !self.shutdown.is_stopping()
            })
            .unwrap_or_else(PoisonError::into_inner);

        let Some(value) = queue.items.pop_front() else {
            if self.shutdown.is_drain_complete() {
                debug_assert_drained_before_done!(
                    queue.items.len(),
                    self.shutdown.is_stopping(),
                    self.shutdown.is_producer_done()
                );
                return ConsumeOutcome::Done;
            }
            return ConsumeOutcome::EmptyWaiting;
        };

        #[cfg(debug_assertions)]
        {
            debug_assert_fifo_pop!(queue.last_popped, value);
            queue.last_popped = Some(value);
        }

        let remaining = queue.items.len();
        drop(queue);

        // More than one producer slot may matter to a waiter; waking all is safe.
        self.not_full.notify_all();

        info!(consumer = name, value, buffer_size = remaining, "consumed");

        ConsumeOutcome::Delivered(Consumption {
            consumer: name.to_owned(),
            value,
            remaining,
        })
    }

    /// Wakes every waiter on both conditions.
    ///
    /// Called on each shutdown transition so nobody stays parked past a
    /// timeout boundary.
    pub fn notify_all(&self) {
        drop(self.lock());
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }

    /// Returns the number of queued items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the front item without removing it.
    pub fn front(&self) -> Option<u64> {
        self.lock().items.front().copied()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    #[inline]
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Returns the shared shutdown flags.
    #[inline]
    pub fn shutdown(&self) -> &Arc<ShutdownState> {
        &self.shutdown
    }

    /// Returns the current shutdown phase, read consistently with the queue.
    pub fn phase(&self) -> ShutdownPhase {
        let queue = self.lock();
        ShutdownPhase::from_flags(
            self.shutdown.is_stopping(),
            self.shutdown.is_producer_done(),
            queue.items.len(),
        )
    }

    // Every critical section leaves the queue consistent, so a poisoned lock
    // is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for BoundedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("len", &self.len())
            .field("capacity", &self.config.capacity)
            .field("shutdown", &self.shutdown)
            .finish_non_exhaustive()
    }
}

/// The single producer of a [`BoundedBuffer`].
///
/// Owns the generator counter, so values are pushed as `0, 1, 2, ...` with no
/// shared state. Finishing or dropping the handle sets `producer_done`; since
/// that consumes the handle, no push can follow it.
pub struct Producer {
    buffer: Arc<BoundedBuffer>,
    next_value: u64,
}

impl Producer {
    /// Pushes the next generated value.
    ///
    /// Waits, re-checking every `wait_timeout`, until there is room or a stop
    /// is requested. Returns `false` without pushing once `stopping` is set.
    pub fn produce(&mut self) -> bool {
        let buffer = &*self.buffer;
        let capacity = buffer.config.capacity;
        let mut queue = buffer.lock();

        loop {
            let (guard, _) = buffer
                .not_full
                .wait_timeout_while(queue, buffer.config.wait_timeout, |q| {
                    q.items.len() >= capacity && !buffer.shutdown.is_stopping()
                })
                .unwrap_or_else(PoisonError::into_inner);
            queue = guard;

            if buffer.shutdown.is_stopping() {
                return false;
            }
            if queue.items.len() < capacity {
                break;
            }
        }

        debug_assert_no_push_after_done!(buffer.shutdown.is_producer_done());

        queue.items.push_back(self.next_value);
        self.next_value += 1;

        debug_assert_bounded_len!(queue.items.len(), capacity);
        drop(queue);

        buffer.not_empty.notify_one();
        true
    }

    /// Returns how many values have been pushed so far.
    #[inline]
    pub fn pushed(&self) -> u64 {
        self.next_value
    }

    #[inline]
    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    /// Marks the producer as permanently done and wakes all waiters.
    ///
    /// Returns the number of values pushed.
    pub fn finish(self) -> u64 {
        let pushed = self.next_value;
        drop(self);
        pushed
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        if self.buffer.shutdown.mark_producer_done() {
            debug!(pushed = self.next_value, "producer done");
        }
        self.buffer.notify_all();
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("next_value", &self.next_value)
            .finish_non_exhaustive()
    }
}

// Note: Producer intentionally does NOT implement Clone.
// A second handle would share neither the counter nor the `producer_done`
// ordering guarantee.

/// A single successful consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    /// Name of the consumer that took the item.
    pub consumer: String,
    /// The consumed value.
    pub value: u64,
    /// Queue length right after the pop.
    pub remaining: usize,
}

/// Result of [`BoundedBuffer::consume`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// An item was removed from the queue.
    Delivered(Consumption),
    /// The queue is empty but more items may still arrive.
    EmptyWaiting,
    /// The queue is empty and no item will ever arrive again.
    Done,
}

impl ConsumeOutcome {
    /// Sentinel used by the integer protocol for [`ConsumeOutcome::Done`].
    pub const DONE_CODE: i64 = -1;

    /// Returns `true` for the terminal outcome.
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the consumed value, if any.
    #[inline]
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Delivered(c) => Some(c.value),
            _ => None,
        }
    }

    /// Encodes the outcome as the integer protocol: remaining size on
    /// delivery, `0` when empty, `-1` when done.
    ///
    /// Note that a delivery leaving the queue empty also encodes as `0`.
    pub fn as_legacy_code(&self) -> i64 {
        match self {
            Self::Delivered(c) => c.remaining as i64,
            Self::EmptyWaiting => 0,
            Self::Done => Self::DONE_CODE,
        }
    }
}
