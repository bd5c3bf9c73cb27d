//! Azimuthal Equidistant projection.
//!
//! Distances and directions from the projection centre are true, which
//! makes it a good fit for binning storm centroids on a metre grid over a
//! single study domain. Spherical formulas (Snyder, Map Projections: A
//! Working Manual, pp. 191-202).

use std::f64::consts::PI;

use storm_common::geometry::EARTH_RADIUS_KM;
use storm_common::longitude::is_valid_latitude;
use storm_common::{GridSpec, MAX_GRID_CELLS};

use crate::error::ProjectionError;

const TO_RAD: f64 = PI / 180.0;
const TO_DEG: f64 = 180.0 / PI;

/// Azimuthal Equidistant projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzimuthalEquidistant {
    /// Central latitude in radians
    pub lat0: f64,
    /// Central longitude in radians
    pub lon0: f64,
    /// Earth radius (metres)
    pub earth_radius: f64,
}

impl AzimuthalEquidistant {
    /// Create a projection centred on the given point (degrees).
    pub fn new(central_lat_deg: f64, central_lon_deg: f64) -> Result<Self, ProjectionError> {
        if !is_valid_latitude(central_lat_deg) {
            return Err(ProjectionError::InvalidCenter(format!(
                "latitude {} is outside [-90, 90]",
                central_lat_deg
            )));
        }
        if !central_lon_deg.is_finite() {
            return Err(ProjectionError::InvalidCenter(format!(
                "longitude {} is not finite",
                central_lon_deg
            )));
        }
        Ok(Self {
            lat0: central_lat_deg * TO_RAD,
            lon0: central_lon_deg * TO_RAD,
            earth_radius: EARTH_RADIUS_KM * 1000.0,
        })
    }

    /// Centre the projection on the middle of a lat/lng grid.
    pub fn centered_on(grid: &GridSpec) -> Result<Self, ProjectionError> {
        let lats = grid.row_coords();
        let lngs = grid.column_coords();
        let (Some(first_lat), Some(last_lat)) = (lats.first(), lats.last()) else {
            return Err(ProjectionError::InvalidCenter("grid has no rows".to_string()));
        };
        let (Some(first_lng), Some(last_lng)) = (lngs.first(), lngs.last()) else {
            return Err(ProjectionError::InvalidCenter("grid has no columns".to_string()));
        };
        Self::new((first_lat + last_lat) / 2.0, (first_lng + last_lng) / 2.0)
    }

    /// Convert geographic coordinates (degrees) to projected x/y (metres).
    pub fn geo_to_xy(&self, lat_deg: f64, lon_deg: f64) -> Result<(f64, f64), ProjectionError> {
        let lat = lat_deg * TO_RAD;
        let mut dlon = lon_deg * TO_RAD - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let cos_c = (self.lat0.sin() * lat.sin() + self.lat0.cos() * lat.cos() * dlon.cos())
            .clamp(-1.0, 1.0);
        let c = cos_c.acos();
        if (PI - c).abs() < 1e-10 {
            return Err(ProjectionError::Antipodal { lat_deg, lon_deg });
        }

        // k' = c / sin(c), which tends to 1 at the centre
        let k = if c.abs() < 1e-12 { 1.0 } else { c / c.sin() };

        let x = self.earth_radius * k * lat.cos() * dlon.sin();
        let y = self.earth_radius
            * k
            * (self.lat0.cos() * lat.sin() - self.lat0.sin() * lat.cos() * dlon.cos());
        Ok((x, y))
    }

    /// Convert projected x/y (metres) back to geographic `(lat, lon)` in degrees.
    pub fn xy_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = (x * x + y * y).sqrt();
        if rho < 1e-9 {
            return (self.lat0 * TO_DEG, self.lon0 * TO_DEG);
        }
        let c = rho / self.earth_radius;

        let lat = (c.cos() * self.lat0.sin() + y * c.sin() * self.lat0.cos() / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lon = self.lon0
            + (x * c.sin()).atan2(rho * self.lat0.cos() * c.cos() - y * self.lat0.sin() * c.sin());

        (lat * TO_DEG, lon * TO_DEG)
    }

    /// Build an x/y grid that covers every point of a lat/lng grid.
    ///
    /// The projected extent of the lat/lng grid points is rounded outward to
    /// the nearest multiple of the spacing, which becomes the grid corners.
    pub fn covering_grid(
        &self,
        latlng_grid: &GridSpec,
        x_spacing_metres: f64,
        y_spacing_metres: f64,
    ) -> Result<GridSpec, ProjectionError> {
        let valid = |s: f64| s.is_finite() && s > 0.0;
        if !(valid(x_spacing_metres) && valid(y_spacing_metres)) {
            return Err(ProjectionError::InvalidSpacing(x_spacing_metres.min(y_spacing_metres)));
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let lngs = latlng_grid.column_coords();
        for lat in latlng_grid.row_coords() {
            for &lng in &lngs {
                let (x, y) = self.geo_to_xy(lat, lng)?;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        let min_x = floor_to_nearest(min_x, x_spacing_metres);
        let max_x = ceiling_to_nearest(max_x, x_spacing_metres);
        let min_y = floor_to_nearest(min_y, y_spacing_metres);
        let max_y = ceiling_to_nearest(max_y, y_spacing_metres);

        let rows = 1.0 + ((max_y - min_y) / y_spacing_metres).round();
        let columns = 1.0 + ((max_x - min_x) / x_spacing_metres).round();
        if !(rows * columns <= MAX_GRID_CELLS as f64) {
            return Err(ProjectionError::InvalidGrid(format!(
                "{} x {} cells exceeds the limit of {}",
                rows, columns, MAX_GRID_CELLS
            )));
        }
        let num_rows = rows as usize;
        let num_columns = columns as usize;

        GridSpec::xy(min_x, min_y, x_spacing_metres, y_spacing_metres, num_rows, num_columns)
            .map_err(|e| ProjectionError::InvalidGrid(e.to_string()))
    }
}

/// Round down to the nearest multiple of `spacing`.
pub fn floor_to_nearest(value: f64, spacing: f64) -> f64 {
    (value / spacing).floor() * spacing
}

/// Round up to the nearest multiple of `spacing`.
pub fn ceiling_to_nearest(value: f64, spacing: f64) -> f64 {
    (value / spacing).ceil() * spacing
}
