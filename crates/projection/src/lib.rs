//! Map projections for storm climatology grids.
//!
//! Azimuthal equidistant transforms used to build metre grids that cover a
//! lat/lng domain and to place storm centroids on them.

pub mod azimuthal;
pub mod error;

pub use azimuthal::{ceiling_to_nearest, floor_to_nearest, AzimuthalEquidistant};
pub use error::ProjectionError;
