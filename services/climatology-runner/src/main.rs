//! Climatology runner.
//!
//! Reads per-date storm-tracking files, counts storm births, deaths or
//! passages, and writes the hour-of-day and spatial climatology as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use climatology::ClimatologyRunner;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use climatology_runner::{
    load_runner_config, write_report, CliOverrides, ClimatologyReport, DirectoryTrackStore,
    LoggingConfig, RunnerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "climatology-runner")]
#[command(about = "Storm birth, death and passage climatologies from tracking data")]
struct Args {
    /// Run configuration file (YAML). Without it, settings come from the environment.
    #[arg(short, long, env = "CLIMATOLOGY_CONFIG")]
    config: Option<PathBuf>,

    /// First SPC date (YYYYMMDD)
    #[arg(long)]
    start: Option<String>,

    /// Last SPC date (YYYYMMDD)
    #[arg(long)]
    end: Option<String>,

    /// birth, death or passage
    #[arg(short, long)]
    mode: Option<String>,

    /// Root of the tracking-file tree
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Report path (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Contiguous date partitions processed in parallel
    #[arg(long)]
    partitions: Option<usize>,

    /// Log level (overridden by RUST_LOG when set)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            start: self.start.clone(),
            end: self.end.clone(),
            mode: self.mode.clone(),
            data_dir: self.data_dir.clone(),
            output: self.output.clone(),
            partitions: self.partitions,
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Logs go to stderr so a report on stdout stays parseable
    if logging.format == "json" {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_runner_config(path)?,
        None => RunnerConfig::from_env(),
    };
    config.apply_overrides(&args.overrides())?;
    config.validate()?;

    init_tracing(&config.logging);

    info!(
        data_dir = %config.data_dir.display(),
        mode = %config.climatology.mode,
        source = %config.climatology.source,
        tracking_scale_m2 = config.climatology.tracking_scale_m2,
        partitions = config.partitions,
        "Starting climatology runner"
    );

    let runner = ClimatologyRunner::new(config.climatology.clone())
        .context("Failed to set up climatology run")?;
    let store = DirectoryTrackStore::new(&config.data_dir);

    let result = if config.partitions > 1 {
        runner.run_partitioned(&store, config.partitions)
    } else {
        runner.run(&store)
    }
    .context("Climatology run failed")?;

    let report = ClimatologyReport::build(&result, runner.dates(), runner.grid());
    write_report(&report, config.output.as_deref())?;

    if let Some(path) = &config.output {
        info!(path = %path.display(), events = result.events, "Wrote climatology report");
    }

    Ok(())
}
