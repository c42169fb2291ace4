use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use gpu_stats::config::MonitorConfig;
use gpu_stats::logger::setup_logging;
use gpu_stats::monitor::Monitor;
use gpu_stats::render::{SnapshotRenderer, DEFAULT_PLOT_FILE};
use gpu_stats::sampler::Sampler;
use gpu_stats::shutdown::spawn_signal_listener;
use gpu_stats::store::TimestampPolicy;
use gpu_stats::tegrastats::DEFAULT_COMMAND;

/// Collect GPU utilization and memory from tegrastats, plot them on Ctrl-C
#[derive(Parser, Debug)]
#[command(name = "gpu-stats")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Metrics command producing tegrastats-style lines
    #[arg(long, default_value = DEFAULT_COMMAND)]
    command: String,

    /// Argument passed to the metrics command (repeatable)
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    args: Vec<String>,

    /// Plot output file
    #[arg(short, long, default_value = DEFAULT_PLOT_FILE)]
    output: PathBuf,

    /// Delay between sampling rounds in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// CPU usage sampling window in milliseconds
    #[arg(long, default_value_t = 1000)]
    cpu_window_ms: u64,

    /// When to record a timestamp: per-line or cumulative
    #[arg(long, default_value_t = TimestampPolicy::PerLine)]
    timestamp_policy: TimestampPolicy,

    /// Keep at most this many samples per series
    #[arg(long)]
    max_samples: Option<usize>,

    /// Enable verbose logging (-v raw lines, -vv everything)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl From<Cli> for MonitorConfig {
    fn from(cli: Cli) -> Self {
        MonitorConfig {
            command: cli.command,
            args: cli.args,
            output: cli.output,
            interval: Duration::from_millis(cli.interval_ms),
            cpu_window: Duration::from_millis(cli.cpu_window_ms),
            timestamp_policy: cli.timestamp_policy,
            max_samples: cli.max_samples,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = MonitorConfig::from(cli);
    info!("config: {}", serde_json::to_string(&config)?);

    let host = Monitor::new().get_system_info();
    info!("system info: {}", serde_json::to_string(&host)?);

    let token = CancellationToken::new();
    let listener = spawn_signal_listener(token.clone());

    info!("Starting to collect system and GPU stats...");
    let renderer = SnapshotRenderer::new(config.output.clone());
    let mut sampler = Sampler::new(config);
    sampler.run(&token).await;

    let store = sampler.into_store();
    if let Err(err) = renderer.render(&store) {
        error!("Failed to save plot to {}: {}", renderer.path().display(), err);
    }

    listener.abort();
    Ok(())
}
