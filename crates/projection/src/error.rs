//! Projection errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("Invalid projection centre: {0}")]
    InvalidCenter(String),

    #[error("Point ({lat_deg}, {lon_deg}) is antipodal to the projection centre")]
    Antipodal { lat_deg: f64, lon_deg: f64 },

    #[error("Grid spacing must be positive, got {0}")]
    InvalidSpacing(f64),

    #[error("Projected grid is invalid: {0}")]
    InvalidGrid(String),
}
