//! Loom-based concurrency tests for the shutdown handshake.
//!
//! Run with: `cargo test -p drainq --features loom --test loom_tests --release`
//!
//! Loom exhaustively explores thread interleavings. The handshake is modelled
//! in isolation (mutex-guarded queue plus the two flags, no timed waits) to
//! keep the state space manageable.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, Ordering};
use loom::sync::{Arc, Mutex};
use loom::thread;
use std::collections::VecDeque;

/// Simplified buffer: same predicates as `BoundedBuffer`, polling instead of waiting.
struct LoomBuffer {
    queue: Mutex<VecDeque<u64>>,
    capacity: usize,
    stopping: AtomicBool,
    producer_done: AtomicBool,
}

enum Pop {
    Item(u64),
    Empty,
    Done,
}

impl LoomBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
            stopping: AtomicBool::new(false),
            producer_done: AtomicBool::new(false),
        }
    }

    /// Producer: push unless stopping. `None` means full, try again.
    fn try_produce(&self, value: u64) -> Option<bool> {
        let mut queue = self.queue.lock().unwrap();
        if self.stopping.load(Ordering::SeqCst) {
            return Some(false);
        }
        if queue.len() >= self.capacity {
            return None;
        }
        queue.push_back(value);
        Some(true)
    }

    fn try_consume(&self) -> Pop {
        let mut queue = self.queue.lock().unwrap();
        match queue.pop_front() {
            Some(value) => Pop::Item(value),
            None if self.stopping.load(Ordering::SeqCst)
                && self.producer_done.load(Ordering::SeqCst) =>
            {
                Pop::Done
            }
            None => Pop::Empty,
        }
    }
}

/// A consumer that observes `Done` has already received every pushed item.
#[test]
fn loom_done_implies_fully_drained() {
    loom::model(|| {
        let buf = Arc::new(LoomBuffer::new(1));

        let producer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                let mut pushed = 0u64;
                for _ in 0..3 {
                    match buf.try_produce(pushed) {
                        Some(true) => pushed += 1,
                        Some(false) => break,
                        None => thread::yield_now(),
                    }
                }
                buf.producer_done.store(true, Ordering::SeqCst);
                pushed
            })
        };

        let watcher = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                buf.stopping.store(true, Ordering::SeqCst);
            })
        };

        let mut received = Vec::new();
        let mut saw_done = false;
        for _ in 0..4 {
            match buf.try_consume() {
                Pop::Item(value) => received.push(value),
                Pop::Done => {
                    saw_done = true;
                    break;
                }
                Pop::Empty => thread::yield_now(),
            }
        }

        let pushed = producer.join().unwrap();
        watcher.join().unwrap();

        // FIFO and no duplication
        assert!(received.windows(2).all(|w| w[0] < w[1]));
        assert!(received.len() as u64 <= pushed);

        if saw_done {
            assert_eq!(received.len() as u64, pushed, "done observed before drain");
        }
    });
}

/// Once stopping is visible under the lock, no further push succeeds.
#[test]
fn loom_no_push_after_stop() {
    loom::model(|| {
        let buf = Arc::new(LoomBuffer::new(2));

        let watcher = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                buf.stopping.store(true, Ordering::SeqCst);
            })
        };

        let first = buf.try_produce(0);
        watcher.join().unwrap();
        let second = buf.try_produce(1);

        assert!(first.is_some(), "capacity 2 never reports full here");
        assert_eq!(second, Some(false));
        assert!(buf.queue.lock().unwrap().len() <= 1);
    });
}
