//! Run configuration for the climatology runner.
//!
//! Loads a YAML run file, with environment variable substitution using
//! `${VAR}` and `${VAR:-default}` syntax, then applies command-line
//! overrides.

use anyhow::{Context, Result};
use climatology::{ClimatologyConfig, ClimatologyMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use storm_common::SpcDate;

/// Default root of the tracking-file tree.
pub const DEFAULT_DATA_DIR: &str = "./data/tracking";

// ============================================================================
// Runner Configuration (run.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Root of the `{source}/scale_{scale}m2/{YYYY}/{YYYYMMDD}` tree.
    pub data_dir: PathBuf,
    /// Report destination. `None` writes to stdout.
    pub output: Option<PathBuf>,
    /// Number of contiguous date partitions processed in parallel.
    pub partitions: usize,
    pub logging: LoggingConfig,
    pub climatology: ClimatologyConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output: None,
            partitions: 1,
            logging: LoggingConfig::default(),
            climatology: ClimatologyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RunnerConfig {
    /// Build a configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self {
            climatology: ClimatologyConfig::from_env(),
            ..Default::default()
        };

        if let Ok(val) = std::env::var("STORM_DATA_DIR") {
            config.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("CLIMATOLOGY_OUTPUT") {
            config.output = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("CLIMATOLOGY_PARTITIONS") {
            if let Ok(partitions) = val.parse() {
                config.partitions = partitions;
            }
        }

        config
    }

    /// Apply command-line overrides on top of the file or environment.
    pub fn apply_overrides(&mut self, overrides: &CliOverrides) -> Result<()> {
        if let Some(start) = &overrides.start {
            self.climatology.first_date =
                Some(SpcDate::parse(start).with_context(|| "Invalid --start date")?);
        }
        if let Some(end) = &overrides.end {
            self.climatology.last_date =
                Some(SpcDate::parse(end).with_context(|| "Invalid --end date")?);
        }
        if let Some(mode) = &overrides.mode {
            self.climatology.mode = mode
                .parse::<ClimatologyMode>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(data_dir) = &overrides.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(output) = &overrides.output {
            self.output = Some(output.clone());
        }
        if let Some(partitions) = overrides.partitions {
            self.partitions = partitions;
        }
        if let Some(level) = &overrides.log_level {
            self.logging.level = level.clone();
        }
        if overrides.json_logs {
            self.logging.format = "json".to_string();
        }
        Ok(())
    }

    /// Validate the whole run configuration.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.partitions > 0, "partitions must be greater than 0");

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        anyhow::ensure!(
            valid_levels.contains(&self.logging.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.logging.level,
            valid_levels
        );

        let valid_formats = ["json", "pretty"];
        anyhow::ensure!(
            valid_formats.contains(&self.logging.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.logging.format,
            valid_formats
        );

        self.climatology
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid climatology configuration: {}", e))
    }
}

/// Values given on the command line, each overriding the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub start: Option<String>,
    pub end: Option<String>,
    pub mode: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub partitions: Option<usize>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse a run file with environment variable substitution.
pub fn load_runner_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read run config from {:?}", path.as_ref()))?;

    parse_runner_config(&content)
        .with_context(|| format!("Failed to parse run config from {:?}", path.as_ref()))
}

/// Parse run-file YAML content.
pub fn parse_runner_config(content: &str) -> Result<RunnerConfig> {
    let expanded = expand_env_vars(content)?;
    let config: RunnerConfig =
        serde_yaml::from_str(&expanded).with_context(|| "Failed to parse run config YAML")?;
    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Substitute `${VAR}` and `${VAR:-default}` references in `content`.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            anyhow::bail!("Unclosed variable substitution: ${{{}", after);
        };
        result.push_str(&lookup_var(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn lookup_var(expr: &str) -> Result<String> {
    match expr.split_once(":-") {
        Some((name, default)) => Ok(std::env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())),
        None => std::env::var(expr).with_context(|| format!("Environment variable {} not set", expr)),
    }
}

// ============================================================================
// Tests
// ============================================================================
