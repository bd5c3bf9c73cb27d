//! Storm footprint geometry.
//!
//! Footprints are simple rings of (longitude, latitude) vertices. Centroids
//! are area-weighted, not the mean of the vertices.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle and area calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DEGREES_TO_RADIANS: f64 = std::f64::consts::PI / 180.0;

/// A storm footprint polygon.
///
/// Vertices are `[x, y]` pairs; for lat/lng footprints `x` is longitude
/// and `y` is latitude. The ring may or may not repeat its first vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    vertices: Vec<[f64; 2]>,
}

impl Polygon {
    pub fn new(vertices: Vec<[f64; 2]>) -> Self {
        Self { vertices }
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(pairs.iter().map(|&(x, y)| [x, y]).collect())
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Signed planar area (shoelace). Positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
            .sum::<f64>()
            / 2.0
    }

    /// Planar area in squared coordinate units.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Centroid as `(x, y)`.
    ///
    /// Uses the area-weighted formula. Rings whose signed area vanishes
    /// (degenerate or self-cancelling, such as a bow-tie) fall back to the
    /// length-weighted centroid of the boundary, and a ring with zero
    /// perimeter falls back to its single point.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut twice_area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for (a, b) in self.edges() {
            let cross = a[0] * b[1] - b[0] * a[1];
            twice_area += cross;
            cx += (a[0] + b[0]) * cross;
            cy += (a[1] + b[1]) * cross;
        }

        let scale = self.bounding_extent().max(f64::MIN_POSITIVE);
        if twice_area.abs() > 1e-12 * scale * scale {
            return Some((cx / (3.0 * twice_area), cy / (3.0 * twice_area)));
        }

        let mut total_length = 0.0;
        let mut lx = 0.0;
        let mut ly = 0.0;
        for (a, b) in self.edges() {
            let length = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
            total_length += length;
            lx += length * (a[0] + b[0]) / 2.0;
            ly += length * (a[1] + b[1]) / 2.0;
        }
        if total_length > 0.0 {
            return Some((lx / total_length, ly / total_length));
        }

        let n = self.vertices.len() as f64;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), v| (sx + v[0], sy + v[1]));
        Some((sx / n, sy / n))
    }

    fn bounding_extent(&self) -> f64 {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min_x = min_x.min(v[0]);
            max_x = max_x.max(v[0]);
            min_y = min_y.min(v[1]);
            max_y = max_y.max(v[1]);
        }
        (max_x - min_x).max(max_y - min_y)
    }

    /// Area in km² of a lat/lng footprint.
    ///
    /// Vertices are projected with a sinusoidal (equal-area) projection
    /// centred on the footprint's centroid longitude before the shoelace sum.
    pub fn area_km2(&self) -> f64 {
        let Some((center_lng, _)) = self.centroid() else {
            return 0.0;
        };

        let projected: Vec<[f64; 2]> = self
            .vertices
            .iter()
            .map(|v| {
                let lat = v[1] * DEGREES_TO_RADIANS;
                let dlng = (v[0] - center_lng) * DEGREES_TO_RADIANS;
                [EARTH_RADIUS_KM * dlng * lat.cos(), EARTH_RADIUS_KM * lat]
            })
            .collect();

        Polygon::new(projected).area()
    }
}

/// Great-circle distance in km between two (longitude, latitude) points.
pub fn haversine_km(lng1_deg: f64, lat1_deg: f64, lng2_deg: f64, lat2_deg: f64) -> f64 {
    let lat1 = lat1_deg * DEGREES_TO_RADIANS;
    let lat2 = lat2_deg * DEGREES_TO_RADIANS;
    let dlat = lat2 - lat1;
    let dlng = (lng2_deg - lng1_deg) * DEGREES_TO_RADIANS;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}
