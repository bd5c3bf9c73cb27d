//! Common types and utilities shared across the storm-climatology workspace.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod longitude;
pub mod storm;
pub mod time;

pub use error::{StormError, StormResult};
pub use geometry::{haversine_km, Polygon};
pub use grid::{nearest_index, GridCell, GridKind, GridSpec, MAX_GRID_CELLS};
pub use longitude::{is_valid_latitude, is_valid_longitude, to_positive_in_west};
pub use storm::{StormObject, StormTable};
pub use time::{
    parse_hour_key, parse_hour_keys, storm_hour_key, utc_hour_of_day, DateIndex, DateRange,
    SpcDate, HOURS_PER_DAY,
};
