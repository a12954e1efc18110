use anyhow::Context;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, BufReader};

use harborwatch_core::clock::SystemClock;
use harborwatch_core::clustering::{
    ClusterAlgorithm, DEFAULT_EPSILON_NM, DEFAULT_GRID_SIZE_DEG, DEFAULT_MIN_POINTS,
};
use harborwatch_monitor::{Monitor, MonitorConfig, TimeSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Algorithm {
    /// Density-based clustering
    Dbscan,
    /// Fixed lat/lon grid cells
    Grid,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Configuration file (default: <config dir>/harborwatch/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// AIS JSON feed, one message per line (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sweep period in seconds
    #[arg(long)]
    tick_seconds: Option<u64>,

    /// Clustering algorithm, overriding the configuration
    #[arg(long, value_enum)]
    algorithm: Option<Algorithm>,

    /// Timestamp source for vessel updates
    #[arg(long, value_enum)]
    time_source: Option<TimeSource>,

    /// Record the track of this vessel (MMSI), may be repeated
    #[arg(long = "follow")]
    follow: Vec<u32>,
}

fn apply_overrides(cli: &Cli, config: &mut MonitorConfig) {
    if let Some(tick_seconds) = cli.tick_seconds {
        config.tick_seconds = tick_seconds;
    }
    if let Some(time_source) = cli.time_source {
        config.time_source = time_source;
    }
    match (cli.algorithm, config.session.clustering) {
        (Some(Algorithm::Dbscan), ClusterAlgorithm::Grid { .. }) => {
            config.session.clustering = ClusterAlgorithm::Dbscan {
                epsilon_nm: DEFAULT_EPSILON_NM,
                min_points: DEFAULT_MIN_POINTS,
            };
        }
        (Some(Algorithm::Grid), ClusterAlgorithm::Dbscan { .. }) => {
            config.session.clustering = ClusterAlgorithm::Grid {
                cell_size_deg: DEFAULT_GRID_SIZE_DEG,
            };
        }
        _ => {}
    }
    config.follow.extend(cli.follow.iter().copied());
}

async fn run(cli: Cli, config: MonitorConfig) -> anyhow::Result<()> {
    let input: Box<dyn AsyncBufRead + Unpin> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Cannot open input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let out = BufWriter::new(io::stdout().lock());
    let mut monitor = Monitor::new(&config, SystemClock, out).context("Invalid zone in configuration")?;
    monitor.run(input).await.context("Monitor failed")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let mut config = MonitorConfig::resolve(cli.config.as_deref()).context("Cannot load configuration")?;
    apply_overrides(&cli, &mut config);
    config.validate().context("Invalid configuration")?;

    log::info!(
        "Starting harborwatch {}: tick {} s, {:?} clustering, {} zones",
        env!("CARGO_PKG_VERSION"),
        config.tick_seconds,
        config.session.clustering,
        config.zones.len()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Cannot start runtime")?;
    runtime.block_on(run(cli, config))
}
