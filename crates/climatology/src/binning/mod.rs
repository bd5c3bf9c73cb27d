//! Temporal and spatial binning of climatology events.

pub mod spatial;
pub mod temporal;

pub use spatial::{
    assign_by_containment, assign_nearest, cell_report, CellValue, CountMatrix, SpatialBinStats,
    SpatialBinner,
};
pub use temporal::HourHistogram;
