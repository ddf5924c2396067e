//! Configuration for the buffer and the tasks driving it.

use std::time::Duration;

/// Configuration for a [`BoundedBuffer`](crate::BoundedBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Maximum number of queued items. Must be at least 1.
    ///
    /// Default: 10
    pub capacity: usize,

    /// Upper bound on a single condition wait.
    ///
    /// Wakeups are event-driven; this interval is the safety net that bounds
    /// the cost of a notification sent before the waiter parked, and the
    /// latency of observing a shutdown transition.
    ///
    /// Default: 100ms
    pub wait_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            wait_timeout: Duration::from_millis(100),
        }
    }
}

impl BufferConfig {
    /// Creates a configuration with the given capacity and the default timeout.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Sets the capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the wait timeout.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// Per-consumer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Name reported in every consumption record.
    pub name: String,
    /// Sleep after finding the buffer empty, before polling again.
    pub backoff: Duration,
}

impl ConsumerConfig {
    pub fn new(name: impl Into<String>, backoff: Duration) -> Self {
        Self {
            name: name.into(),
            backoff,
        }
    }
}

/// Configuration for a full watcher/producer/consumers [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Buffer settings.
    pub buffer: BufferConfig,

    /// Pause between successive pushes.
    ///
    /// Default: 50ms
    pub produce_interval: Duration,

    /// How often the watcher polls the interrupt flag.
    ///
    /// Default: 100ms
    pub watch_interval: Duration,

    /// One entry per consumer thread.
    ///
    /// Default: `cons1` backing off 300ms and `cons2` backing off 200ms.
    pub consumers: Vec<ConsumerConfig>,

    /// Stop the producer loop after this many pushes.
    ///
    /// Reaching the limit finishes the producer but does not set `stopping`;
    /// consumers still exit only after an interrupt. Default: unlimited.
    pub produce_limit: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            produce_interval: Duration::from_millis(50),
            watch_interval: Duration::from_millis(100),
            consumers: vec![
                ConsumerConfig::new("cons1", Duration::from_millis(300)),
                ConsumerConfig::new("cons2", Duration::from_millis(200)),
            ],
            produce_limit: None,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with short intervals, for tests and demos
    /// that need shutdown to settle quickly.
    pub fn fast() -> Self {
        Self {
            buffer: BufferConfig::default().with_wait_timeout(Duration::from_millis(10)),
            produce_interval: Duration::from_millis(1),
            watch_interval: Duration::from_millis(5),
            consumers: vec![
                ConsumerConfig::new("cons1", Duration::from_millis(3)),
                ConsumerConfig::new("cons2", Duration::from_millis(2)),
            ],
            produce_limit: None,
        }
    }

    /// Sets the buffer configuration.
    pub fn with_buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the pause between pushes.
    pub fn with_produce_interval(mut self, interval: Duration) -> Self {
        self.produce_interval = interval;
        self
    }

    /// Sets the watcher poll interval.
    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    /// Replaces the consumer list.
    pub fn with_consumers(mut self, consumers: Vec<ConsumerConfig>) -> Self {
        self.consumers = consumers;
        self
    }

    /// Caps the number of items the producer pushes.
    pub fn with_produce_limit(mut self, limit: u64) -> Self {
        self.produce_limit = Some(limit);
        self
    }
}
