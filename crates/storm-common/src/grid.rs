//! Regular grids used for spatial binning.
//!
//! Grid points are cell **centres**; each cell extends half a spacing to
//! either side of its centre along both axes. Rows ascend with latitude
//! (or y) and columns ascend with longitude (or x).

use serde::{Deserialize, Serialize};

use crate::error::{StormError, StormResult};
use crate::longitude::{is_valid_latitude, to_positive_in_west};

/// Upper bound on `num_rows * num_columns` for any grid.
pub const MAX_GRID_CELLS: usize = 25_000_000;

/// Coordinate system of a grid's axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    /// Rows are latitudes, columns are longitudes (degrees, positive in west).
    LatLng,
    /// Rows are y, columns are x (metres in a projected plane).
    Projected,
}

/// Specification of a regular grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub kind: GridKind,
    /// Number of rows (unique row coordinates).
    pub num_rows: usize,
    /// Number of columns (unique column coordinates).
    pub num_columns: usize,
    /// Spacing between adjacent rows (degrees or metres).
    pub row_spacing: f64,
    /// Spacing between adjacent columns.
    pub column_spacing: f64,
    /// Row coordinate of the first (southernmost) grid point.
    pub first_row: f64,
    /// Column coordinate of the first (westernmost) grid point.
    pub first_column: f64,
    /// Optional irregular study-domain mask, row-major. `false` cells are
    /// outside the domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_mask: Option<Vec<bool>>,
}

impl GridSpec {
    /// Create a regular lat/lng grid.
    ///
    /// The minimum longitude is converted to [0, 360).
    pub fn latlng(
        min_latitude_deg: f64,
        min_longitude_deg: f64,
        lat_spacing_deg: f64,
        lng_spacing_deg: f64,
        num_rows: usize,
        num_columns: usize,
    ) -> StormResult<Self> {
        if !is_valid_latitude(min_latitude_deg) {
            return Err(StormError::InvalidLatitude(min_latitude_deg));
        }
        if !min_longitude_deg.is_finite() {
            return Err(StormError::invalid_grid("min_longitude_deg", "must be finite"));
        }

        let spec = Self {
            kind: GridKind::LatLng,
            num_rows,
            num_columns,
            row_spacing: lat_spacing_deg,
            column_spacing: lng_spacing_deg,
            first_row: min_latitude_deg,
            first_column: to_positive_in_west(min_longitude_deg),
            domain_mask: None,
        };
        spec.validate()?;

        let max_latitude = spec.first_row + (num_rows - 1) as f64 * lat_spacing_deg;
        if !is_valid_latitude(max_latitude) {
            return Err(StormError::InvalidLatitude(max_latitude));
        }
        Ok(spec)
    }

    /// Create a regular projected x/y grid in metres.
    pub fn xy(
        min_x_metres: f64,
        min_y_metres: f64,
        x_spacing_metres: f64,
        y_spacing_metres: f64,
        num_rows: usize,
        num_columns: usize,
    ) -> StormResult<Self> {
        if !min_x_metres.is_finite() || !min_y_metres.is_finite() {
            return Err(StormError::invalid_grid("min_xy", "corner must be finite"));
        }
        let spec = Self {
            kind: GridKind::Projected,
            num_rows,
            num_columns,
            row_spacing: y_spacing_metres,
            column_spacing: x_spacing_metres,
            first_row: min_y_metres,
            first_column: min_x_metres,
            domain_mask: None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Attach an irregular study-domain mask (row-major, `num_rows * num_columns`).
    pub fn with_domain_mask(mut self, mask: Vec<bool>) -> StormResult<Self> {
        if mask.len() != self.len() {
            return Err(StormError::invalid_grid(
                "domain_mask",
                format!("expected {} cells, got {}", self.len(), mask.len()),
            ));
        }
        self.domain_mask = Some(mask);
        Ok(self)
    }

    /// Validate spacing and dimensions.
    pub fn validate(&self) -> StormResult<()> {
        if !(self.row_spacing.is_finite() && self.row_spacing > 0.0) {
            return Err(StormError::invalid_grid("row_spacing", "must be > 0"));
        }
        if !(self.column_spacing.is_finite() && self.column_spacing > 0.0) {
            return Err(StormError::invalid_grid("column_spacing", "must be > 0"));
        }
        if self.num_rows == 0 {
            return Err(StormError::invalid_grid("num_rows", "must be > 0"));
        }
        if self.num_columns == 0 {
            return Err(StormError::invalid_grid("num_columns", "must be > 0"));
        }
        match self.num_rows.checked_mul(self.num_columns) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(StormError::invalid_grid(
                    "num_rows * num_columns",
                    format!("must not exceed {} cells", MAX_GRID_CELLS),
                ))
            }
        }
        if let Some(mask) = &self.domain_mask {
            if mask.len() != self.len() {
                return Err(StormError::invalid_grid("domain_mask", "size does not match grid"));
            }
        }
        Ok(())
    }

    /// Unique row coordinates (grid-point latitudes or y), ascending.
    pub fn row_coords(&self) -> Vec<f64> {
        linspace(self.first_row, self.row_spacing, self.num_rows)
    }

    /// Unique column coordinates (grid-point longitudes or x), ascending.
    pub fn column_coords(&self) -> Vec<f64> {
        linspace(self.first_column, self.column_spacing, self.num_columns)
    }

    /// Expand the coordinate vectors into `num_rows x num_columns` matrices.
    ///
    /// `row_matrix[i][*] = row_coords[i]` and `column_matrix[*][j] = column_coords[j]`.
    pub fn meshgrid(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let rows = self.row_coords();
        let cols = self.column_coords();
        let row_matrix = rows.iter().map(|&r| vec![r; cols.len()]).collect();
        let column_matrix = rows.iter().map(|_| cols.clone()).collect();
        (row_matrix, column_matrix)
    }

    /// Convert a grid index to its cell.
    pub fn index_to_cell(&self, row: usize, col: usize) -> Option<GridCell> {
        if row >= self.num_rows || col >= self.num_columns {
            return None;
        }
        Some(GridCell {
            row,
            col,
            center_row: self.first_row + row as f64 * self.row_spacing,
            center_column: self.first_column + col as f64 * self.column_spacing,
            half_row_spacing: self.row_spacing / 2.0,
            half_column_spacing: self.column_spacing / 2.0,
        })
    }

    /// Row-major flat index.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.num_columns + col
    }

    /// Whether a cell lies inside the study domain.
    pub fn in_domain(&self, row: usize, col: usize) -> bool {
        match &self.domain_mask {
            Some(mask) => mask.get(self.flat_index(row, col)).copied().unwrap_or(false),
            None => row < self.num_rows && col < self.num_columns,
        }
    }

    /// Convert a longitude to the grid's convention.
    ///
    /// Longitudes go to [0, 360); when the grid extends past 360 degrees,
    /// points west of the first column are shifted up by one revolution.
    pub fn normalize_longitude(&self, longitude_deg: f64) -> f64 {
        let lng = to_positive_in_west(longitude_deg);
        let half = self.column_spacing / 2.0;
        let last =
            self.first_column + self.num_columns.saturating_sub(1) as f64 * self.column_spacing;
        if lng < self.first_column - half && lng + 360.0 <= last + half {
            lng + 360.0
        } else {
            lng
        }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.num_rows.saturating_mul(self.num_columns)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0 || self.num_columns == 0
    }
}

/// One grid cell: centre coordinate and half-spacing boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    pub center_row: f64,
    pub center_column: f64,
    pub half_row_spacing: f64,
    pub half_column_spacing: f64,
}

impl GridCell {
    /// Closed containment test: `[center - spacing/2, center + spacing/2]` on both axes.
    pub fn contains(&self, row_value: f64, column_value: f64) -> bool {
        (self.center_row - self.half_row_spacing..=self.center_row + self.half_row_spacing)
            .contains(&row_value)
            && (self.center_column - self.half_column_spacing
                ..=self.center_column + self.half_column_spacing)
                .contains(&column_value)
    }
}

/// `n` evenly spaced values starting at `start`.
fn linspace(start: f64, spacing: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + i as f64 * spacing).collect()
}

/// Index of the value in `sorted` nearest to `value`.
///
/// Finds the insertion point with a binary search (left side), then compares
/// the distance to the neighbour on each side; exact ties go to the lower
/// index. Returns `None` only for an empty slice.
pub fn nearest_index(sorted: &[f64], value: f64) -> Option<usize> {
    if sorted.is_empty() {
        return None;
    }
    let insertion = sorted.partition_point(|&c| c < value);
    if insertion == 0 {
        return Some(0);
    }
    if insertion == sorted.len() {
        return Some(sorted.len() - 1);
    }
    let below = value - sorted[insertion - 1];
    let above = sorted[insertion] - value;
    if below <= above {
        Some(insertion - 1)
    } else {
        Some(insertion)
    }
}

/// Common grids from the storm-climatology study domain.
pub mod grids {
    use super::*;

    /// 0.1 degree CONUS grid: 20-55 N, 230-300 E.
    pub fn conus_0p1() -> GridSpec {
        GridSpec {
            kind: GridKind::LatLng,
            num_rows: 351,
            num_columns: 701,
            row_spacing: 0.1,
            column_spacing: 0.1,
            first_row: 20.0,
            first_column: 230.0,
            domain_mask: None,
        }
    }
}
