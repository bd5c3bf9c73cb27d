//! Error types for climatology aggregation.

use storm_common::{SpcDate, StormError};
use thiserror::Error;

/// Errors that can occur while building a climatology.
#[derive(Error, Debug)]
pub enum ClimatologyError {
    /// Invalid run configuration. Reported before any date is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The track store failed to list or read files for a date.
    #[error("track store error for SPC date {date}: {message}")]
    Store { date: String, message: String },

    /// A storm-track row or grid was invalid.
    #[error("storm data error: {0}")]
    Storm(#[from] StormError),

    /// Projection of a location onto an x/y grid failed.
    #[error("projection error: {0}")]
    Projection(String),

    /// Partial results with different shapes cannot be merged.
    #[error("cannot merge results: {0}")]
    Merge(String),
}

impl ClimatologyError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a Store error naming the failing SPC date.
    pub fn store(date: SpcDate, msg: impl Into<String>) -> Self {
        Self::Store {
            date: date.to_string(),
            message: msg.into(),
        }
    }

    /// Create a Merge error.
    pub fn merge(msg: impl Into<String>) -> Self {
        Self::Merge(msg.into())
    }

    /// Whether the run was rejected before processing started.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Configuration(_) => true,
            Self::Storm(err) => err.is_configuration_error(),
            _ => false,
        }
    }
}

impl From<projection::ProjectionError> for ClimatologyError {
    fn from(err: projection::ProjectionError) -> Self {
        Self::Projection(err.to_string())
    }
}

/// Result type for climatology operations.
pub type Result<T> = std::result::Result<T, ClimatologyError>;
