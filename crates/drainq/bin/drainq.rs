//! Runs one producer and N consumers over a bounded buffer until SIGINT/SIGTERM.
//!
//! Run with: `cargo run -p drainq --bin drainq -- --capacity 10`

use anyhow::{Context, Result};
use clap::Parser;
use drainq::{BufferConfig, ConsumerConfig, InterruptFlag, Pipeline, PipelineConfig};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "drainq",
    about = "Bounded producer/consumer buffer with drain-before-exit shutdown"
)]
struct Args {
    /// Maximum number of queued items.
    #[arg(long, default_value_t = 10)]
    capacity: usize,

    /// Number of consumer threads.
    #[arg(long, default_value_t = 2)]
    consumers: usize,

    /// Empty-buffer backoff per consumer (milliseconds). Repeat to give each
    /// consumer its own value; the list is cycled when shorter than --consumers.
    #[arg(long = "backoff-ms", default_values_t = [300, 200])]
    backoff_ms: Vec<u64>,

    /// Pause between pushes (milliseconds).
    #[arg(long, default_value_t = 50)]
    produce_interval_ms: u64,

    /// Upper bound on one buffer wait before re-checking (milliseconds).
    #[arg(long, default_value_t = 100)]
    wait_timeout_ms: u64,

    /// Interrupt poll interval of the watcher (milliseconds).
    #[arg(long, default_value_t = 100)]
    watch_interval_ms: u64,

    /// Raise the interrupt after this long, as if SIGINT had arrived.
    #[arg(long)]
    run_for_ms: Option<u64>,

    /// Logging level (error|warn|info|debug|trace).
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let consumers = self
            .backoff_ms
            .iter()
            .cycle()
            .take(self.consumers)
            .enumerate()
            .map(|(i, ms)| ConsumerConfig::new(format!("cons{}", i + 1), Duration::from_millis(*ms)))
            .collect();

        PipelineConfig::default()
            .with_buffer(
                BufferConfig::new(self.capacity)
                    .with_wait_timeout(Duration::from_millis(self.wait_timeout_ms)),
            )
            .with_produce_interval(Duration::from_millis(self.produce_interval_ms))
            .with_watch_interval(Duration::from_millis(self.watch_interval_ms))
            .with_consumers(consumers)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let interrupt =
        InterruptFlag::register_term_signals().context("failed to install signal handlers")?;

    if let Some(ms) = args.run_for_ms {
        let trigger = interrupt.trigger();
        thread::Builder::new()
            .name("deadline".to_owned())
            .spawn(move || {
                thread::sleep(Duration::from_millis(ms));
                trigger.fire();
            })
            .context("failed to spawn deadline thread")?;
    }

    let report = Pipeline::new(args.pipeline_config())
        .run(interrupt)
        .context("pipeline failed")?;

    info!(
        pushed = report.pushed,
        consumed = report.total_consumed(),
        "all tasks joined"
    );
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::builder()
        .parse(level)
        .with_context(|| format!("invalid log level '{level}'"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
