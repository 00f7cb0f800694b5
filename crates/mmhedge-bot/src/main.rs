//! mmhedge market maker - entry point
//!
//! Replays a recorded session through the quoting engine and writes the
//! resulting orders as JSON lines.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mmhedge_bot::{AppConfig, ReplayGateway, SessionRunner};
use mmhedge_telemetry::Metrics;
use tracing::info;

/// Delta-hedged perp market maker
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MMHEDGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Session event file, overrides `session.path`
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Order output file, overrides `session.output_path` (stdout when unset)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pace snapshots by the configured tick interval
    #[arg(long)]
    realtime: bool,

    /// Print Prometheus metrics to stderr when the session ends
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    mmhedge_telemetry::init_logging()?;

    info!("Starting mmhedge bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > MMHEDGE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("MMHEDGE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");

    let mut config = AppConfig::load(&config_path)?;
    if let Some(session) = args.session {
        config.session.path = session;
    }
    if let Some(output) = args.output {
        config.session.output_path = Some(output);
    }
    config.session.realtime |= args.realtime;

    info!(
        market = %config.market,
        session = %config.session.path.display(),
        on_error = ?config.session.on_error,
        "Configuration loaded"
    );

    let reader = BufReader::new(
        File::open(&config.session.path)
            .with_context(|| format!("opening session {}", config.session.path.display()))?,
    );
    let writer: Box<dyn Write> = match &config.session.output_path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut runner = SessionRunner::new(&config, ReplayGateway::new(reader, writer))?;
    let summary = runner.run().await?;

    info!(
        ticks = summary.ticks,
        orders_submitted = summary.orders_submitted,
        final_wealth = summary.final_wealth,
        "Done"
    );

    if args.print_metrics {
        eprint!("{}", Metrics::gather_text()?);
    }

    Ok(())
}
