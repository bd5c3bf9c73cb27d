//! Climatology runner library.
//!
//! Everything the `climatology-runner` binary needs besides argument
//! parsing: run-file loading, the on-disk track store and the JSON report.

pub mod config;
pub mod report;
pub mod store;

pub use config::{load_runner_config, CliOverrides, LoggingConfig, RunnerConfig};
pub use report::{write_report, ClimatologyReport, GridReport};
pub use store::DirectoryTrackStore;
