//! Watcher, producer and consumer threads around one shared buffer.

use crate::{
    BoundedBuffer, ConsumeOutcome, ConsumerConfig, Consumption, DrainqError, InterruptFlag,
    PipelineConfig, Producer, ShutdownPhase, ShutdownState, WatchOutcome, Watcher,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Producer loop: push until a stop is requested, then finish the handle.
///
/// `pace` is slept after every push. With a `limit`, the loop also ends after
/// that many pushes. Finishing sets `producer_done` and wakes every waiter.
/// Returns the number of values pushed.
pub fn run_producer(mut producer: Producer, pace: Duration, limit: Option<u64>) -> u64 {
    let shutdown = Arc::clone(producer.buffer().shutdown());

    while !shutdown.is_stopping() {
        if limit.is_some_and(|limit| producer.pushed() >= limit) {
            debug!(pushed = producer.pushed(), "produce limit reached");
            break;
        }
        if !producer.produce() {
            break;
        }
        thread::sleep(pace);
    }

    producer.finish()
}

/// What a single consumer took out of the buffer, in consumption order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub name: String,
    pub consumed: Vec<Consumption>,
}

impl ConsumerReport {
    /// Consumed values in the order this consumer received them.
    pub fn values(&self) -> Vec<u64> {
        self.consumed.iter().map(|c| c.value).collect()
    }
}

/// Consumer loop: take items until the buffer reports [`ConsumeOutcome::Done`].
///
/// Sleeps `config.backoff` whenever the buffer is empty but not finished.
pub fn run_consumer(buffer: &BoundedBuffer, config: &ConsumerConfig) -> ConsumerReport {
    let mut consumed = Vec::new();

    loop {
        match buffer.consume(&config.name) {
            ConsumeOutcome::Delivered(consumption) => consumed.push(consumption),
            ConsumeOutcome::EmptyWaiting => thread::sleep(config.backoff),
            ConsumeOutcome::Done => break,
        }
    }

    debug!(consumer = %config.name, count = consumed.len(), "consumer done");
    ConsumerReport {
        name: config.name.clone(),
        consumed,
    }
}

/// Builds the shared state and spawns every task.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Spawns the watcher, the producer and one thread per consumer.
    ///
    /// If a thread fails to spawn, a stop is requested so the tasks already
    /// running wind down on their own.
    pub fn spawn(self, interrupt: InterruptFlag) -> Result<PipelineHandle, DrainqError> {
        let config = self.config;
        if config.consumers.is_empty() {
            return Err(DrainqError::NoConsumers);
        }

        let shutdown = Arc::new(ShutdownState::new());
        let buffer = Arc::new(BoundedBuffer::new(config.buffer, Arc::clone(&shutdown))?);
        let producer = buffer.producer()?;

        let abort = |err: DrainqError| {
            shutdown.request_stop();
            buffer.notify_all();
            err
        };

        let watcher = Watcher::new(Arc::clone(&buffer), interrupt, config.watch_interval);
        let watcher = spawn_task("watcher", move || watcher.run()).map_err(abort)?;

        let (pace, limit) = (config.produce_interval, config.produce_limit);
        let producer =
            spawn_task("producer", move || run_producer(producer, pace, limit)).map_err(abort)?;

        let mut consumers = Vec::with_capacity(config.consumers.len());
        for consumer in config.consumers {
            let name = consumer.name.clone();
            let buf = Arc::clone(&buffer);
            let handle =
                spawn_task(&name, move || run_consumer(&buf, &consumer)).map_err(abort)?;
            consumers.push((name, handle));
        }

        info!(
            capacity = buffer.capacity(),
            consumers = consumers.len(),
            "pipeline started"
        );

        Ok(PipelineHandle {
            buffer,
            watcher,
            producer,
            consumers,
        })
    }

    /// Spawns the pipeline and blocks until it has fully shut down.
    pub fn run(self, interrupt: InterruptFlag) -> Result<PipelineReport, DrainqError> {
        self.spawn(interrupt)?.join()
    }
}

fn spawn_task<F, T>(name: &str, task: F) -> Result<JoinHandle<T>, DrainqError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.to_owned())
        .spawn(task)
        .map_err(|source| DrainqError::Spawn {
            task: name.to_owned(),
            source,
        })
}

/// Handles to a running pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    buffer: Arc<BoundedBuffer>,
    watcher: JoinHandle<WatchOutcome>,
    producer: JoinHandle<u64>,
    consumers: Vec<(String, JoinHandle<ConsumerReport>)>,
}

impl PipelineHandle {
    #[inline]
    pub fn buffer(&self) -> &Arc<BoundedBuffer> {
        &self.buffer
    }

    /// Waits for the producer, then every consumer, then the watcher.
    ///
    /// Every thread is joined even if one of them panicked; the first panic
    /// is reported.
    pub fn join(self) -> Result<PipelineReport, DrainqError> {
        let mut first_panic = None;
        let mut note_panic = |task: &str| {
            first_panic.get_or_insert_with(|| DrainqError::TaskPanicked {
                task: task.to_owned(),
            });
        };

        let pushed = match self.producer.join() {
            Ok(pushed) => pushed,
            Err(_) => {
                note_panic("producer");
                0
            }
        };

        let mut consumers = Vec::with_capacity(self.consumers.len());
        for (name, handle) in self.consumers {
            match handle.join() {
                Ok(report) => consumers.push(report),
                Err(_) => note_panic(&name),
            }
        }

        let watch = match self.watcher.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                note_panic("watcher");
                WatchOutcome::StoppedElsewhere
            }
        };

        if let Some(err) = first_panic {
            return Err(err);
        }

        let phase = self.buffer.phase();
        info!(pushed, ?phase, "pipeline shut down");

        Ok(PipelineReport {
            pushed,
            consumers,
            watch,
            phase,
        })
    }
}

/// Summary of a finished pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Values pushed by the producer (`0..pushed`).
    pub pushed: u64,
    /// One report per consumer, in configuration order.
    pub consumers: Vec<ConsumerReport>,
    /// How the watcher ended.
    pub watch: WatchOutcome,
    /// Phase observed after every task joined.
    pub phase: ShutdownPhase,
}

impl PipelineReport {
    /// Total items consumed across all consumers.
    pub fn total_consumed(&self) -> usize {
        self.consumers.iter().map(|c| c.consumed.len()).sum()
    }

    /// Every consumed value, sorted.
    pub fn all_values(&self) -> Vec<u64> {
        let mut values: Vec<u64> = self.consumers.iter().flat_map(ConsumerReport::values).collect();
        values.sort_unstable();
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferConfig;

    fn buffer(capacity: usize) -> Arc<BoundedBuffer> {
        let config = BufferConfig::new(capacity).with_wait_timeout(Duration::from_millis(5));
        Arc::new(BoundedBuffer::new(config, Arc::new(ShutdownState::new())).unwrap())
    }

    #[test]
    fn test_producer_stops_at_limit_without_stopping() {
        let buf = buffer(8);
        let producer = buf.producer().unwrap();

        let pushed = run_producer(producer, Duration::ZERO, Some(5));

        assert_eq!(pushed, 5);
        assert_eq!(buf.len(), 5);
        assert!(buf.shutdown().is_producer_done());
        assert!(!buf.shutdown().is_stopping());
    }

    #[test]
    fn test_producer_exits_immediately_when_stopped() {
        let buf = buffer(8);
        let producer = buf.producer().unwrap();
        buf.shutdown().request_stop();

        assert_eq!(run_producer(producer, Duration::ZERO, None), 0);
        assert_eq!(buf.phase(), ShutdownPhase::Drained);
    }

    #[test]
    fn test_consumer_drains_then_exits() {
        let buf = buffer(4);
        let producer = buf.producer().unwrap();
        run_producer(producer, Duration::ZERO, Some(3));
        buf.shutdown().request_stop();

        let report = run_consumer(&buf, &ConsumerConfig::new("c", Duration::from_millis(1)));

        assert_eq!(report.name, "c");
        assert_eq!(report.values(), vec![0, 1, 2]);
        assert_eq!(report.consumed[2].remaining, 0);
    }

    #[test]
    fn test_spawn_rejects_empty_consumer_list() {
        let config = PipelineConfig::fast().with_consumers(Vec::new());
        let result = Pipeline::new(config).spawn(InterruptFlag::new());
        assert!(matches!(result, Err(DrainqError::NoConsumers)));
    }
}
