//! Error types for storm-track data handling.

use thiserror::Error;

/// Result type alias using StormError.
pub type StormResult<T> = Result<T, StormError>;

/// Primary error type for storm-track types, grids and geometry.
#[derive(Debug, Error)]
pub enum StormError {
    // === Date Errors ===
    #[error("Invalid SPC date '{0}' (expected YYYYMMDD)")]
    InvalidDate(String),

    #[error("Invalid date range: first date {first} is after last date {last}")]
    InvalidDateRange { first: String, last: String },

    // === Grid Errors ===
    #[error("Invalid grid definition for '{param}': {message}")]
    InvalidGrid { param: String, message: String },

    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    // === Table Errors ===
    #[error("Missing required column '{column}' in storm object row")]
    MissingColumn { column: String },

    #[error("Invalid value for column '{column}': {message}")]
    InvalidColumnValue { column: String, message: String },

    #[error("Invalid storm-hour key: {0}")]
    InvalidHourKey(String),
}

impl StormError {
    /// Create an InvalidGrid error.
    pub fn invalid_grid(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidColumnValue error.
    pub fn invalid_column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidColumnValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Whether this error describes a bad run configuration rather than bad data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            StormError::InvalidDate(_)
                | StormError::InvalidDateRange { .. }
                | StormError::InvalidGrid { .. }
                | StormError::InvalidLatitude(_)
        )
    }
}

impl From<serde_json::Error> for StormError {
    fn from(err: serde_json::Error) -> Self {
        StormError::invalid_column("<row>", format!("JSON error: {}", err))
    }
}
