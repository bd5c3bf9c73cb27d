//! Storm-track climatology aggregation.
//!
//! Builds spatial and temporal climatologies of storm birth, death and
//! passage from per-date storm-tracking tables.
//!
//! # Architecture
//!
//! ```text
//! ClimatologyRunner::run(store)
//!      │
//!      ├─► resolve(w, N, mode)              which dates load together
//!      │
//!      ├─► TrackTableCache                  evict stale dates, load new ones
//!      │         │
//!      │         └─► TrackStore::list_files / read_tables
//!      │
//!      ├─► stitch(tables, min_age)          union columns, concat, mature only
//!      │
//!      ├─► classify(table, mode)            birth / death / passage events
//!      │
//!      └─► HourHistogram, SpatialBinner,    accumulate across the whole run
//!          StatisticsAccumulator
//! ```
//!
//! # Example
//!
//! ```ignore
//! use climatology::{ClimatologyConfig, ClimatologyMode, ClimatologyRunner};
//!
//! let config = ClimatologyConfig {
//!     first_date: Some(SpcDate::parse("20110401")?),
//!     last_date: Some(SpcDate::parse("20110430")?),
//!     mode: ClimatologyMode::Birth,
//!     ..Default::default()
//! };
//! let runner = ClimatologyRunner::new(config)?;
//! let result = runner.run(&store)?;
//! println!("{:?}", result.hour_histogram.counts());
//! ```

pub mod binning;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod statistics;
pub mod stitch;
pub mod store;
pub mod window;

// Re-export commonly used types at crate root
pub use binning::{
    assign_by_containment, assign_nearest, cell_report, CellValue, CountMatrix, HourHistogram,
    SpatialBinStats, SpatialBinner,
};
pub use cache::{CacheStats, TrackTableCache};
pub use classify::{classify, ClassifierOptions, ClimatologyEvent, EventLocation};
pub use config::{BinningGrid, ClimatologyConfig, GridDefinition, LatLngDomain, TrailingFilter};
pub use error::{ClimatologyError, Result};
pub use pipeline::{partition_indices, ClimatologyResult, ClimatologyRunner};
pub use statistics::{StatisticsAccumulator, StatisticsReport, Summary};
pub use stitch::{concat_tables, stitch};
pub use store::{date_directory, MemoryTrackStore, TrackStore, TrackStoreError};
pub use window::{resolve, ClimatologyMode, MAX_WINDOW_SIZE};
