//! Grid-cell count matrix.
//!
//! Each event is assigned to the cell whose centre is nearest along both
//! axes. Grid points are cell centres and cells extend half a spacing to
//! either side, so nearest-centre and containment agree everywhere except
//! on shared cell edges, where the lower index wins in both.

use serde::{Deserialize, Serialize, Serializer};
use storm_common::{nearest_index, GridKind, GridSpec};

use crate::classify::ClimatologyEvent;
use crate::config::BinningGrid;
use crate::error::{ClimatologyError, Result};

/// Row-major event counts over a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMatrix {
    num_rows: usize,
    num_columns: usize,
    counts: Vec<u64>,
}

impl CountMatrix {
    pub fn zeros(num_rows: usize, num_columns: usize) -> Self {
        Self {
            num_rows,
            num_columns,
            counts: vec![0; num_rows * num_columns],
        }
    }

    pub fn for_grid(grid: &GridSpec) -> Self {
        Self::zeros(grid.num_rows, grid.num_columns)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u64> {
        if row >= self.num_rows || col >= self.num_columns {
            return None;
        }
        self.counts.get(row * self.num_columns + col).copied()
    }

    pub fn increment(&mut self, row: usize, col: usize) {
        if row < self.num_rows && col < self.num_columns {
            self.counts[row * self.num_columns + col] += 1;
        }
    }

    /// Elementwise addition. Both matrices must have the same shape.
    pub fn merge(&mut self, other: &CountMatrix) -> Result<()> {
        if self.num_rows != other.num_rows || self.num_columns != other.num_columns {
            return Err(ClimatologyError::merge(format!(
                "count matrix {}x{} vs {}x{}",
                self.num_rows, self.num_columns, other.num_rows, other.num_columns
            )));
        }
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of cells with at least one event.
    pub fn nonzero_cells(&self) -> usize {
        self.counts.iter().filter(|&&n| n > 0).count()
    }

    /// Rows as nested vectors, row 0 first.
    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.counts
            .chunks(self.num_columns.max(1))
            .map(|row| row.to_vec())
            .collect()
    }
}

/// Reported value of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CellValue {
    Count(u64),
    /// Inside the domain with zero events. Masked in the report.
    NoData,
    /// Excluded by the study-domain mask.
    OutsideDomain,
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Count(n) => serializer.serialize_u64(*n),
            CellValue::NoData => serializer.serialize_none(),
            CellValue::OutsideDomain => serializer.serialize_str("outside"),
        }
    }
}

/// Per-cell report of a count matrix, row 0 first.
pub fn cell_report(counts: &CountMatrix, grid: &GridSpec) -> Vec<Vec<CellValue>> {
    (0..counts.num_rows())
        .map(|row| {
            (0..counts.num_columns())
                .map(|col| {
                    if !grid.in_domain(row, col) {
                        CellValue::OutsideDomain
                    } else {
                        match counts.get(row, col) {
                            Some(0) | None => CellValue::NoData,
                            Some(n) => CellValue::Count(n),
                        }
                    }
                })
                .collect()
        })
        .collect()
}

/// Cell containing a point by nearest grid line along each axis.
///
/// Points more than half a spacing beyond the outer grid lines are
/// outside the grid.
pub fn assign_nearest(
    row_coords: &[f64],
    column_coords: &[f64],
    row_spacing: f64,
    column_spacing: f64,
    row_value: f64,
    column_value: f64,
) -> Option<(usize, usize)> {
    let row = nearest_index(row_coords, row_value)?;
    let col = nearest_index(column_coords, column_value)?;
    if (row_value - row_coords[row]).abs() > row_spacing / 2.0
        || (column_value - column_coords[col]).abs() > column_spacing / 2.0
    {
        return None;
    }
    Some((row, col))
}

/// Cell containing a point by testing every cell in row-major order.
///
/// Reference for [`assign_nearest`]; the lowest matching index wins.
pub fn assign_by_containment(
    grid: &GridSpec,
    row_value: f64,
    column_value: f64,
) -> Option<(usize, usize)> {
    for row in 0..grid.num_rows {
        for col in 0..grid.num_columns {
            let cell = grid.index_to_cell(row, col)?;
            if cell.contains(row_value, column_value) {
                return Some((row, col));
            }
        }
    }
    None
}

/// Counts from one call to [`SpatialBinner::bin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpatialBinStats {
    pub binned: u64,
    pub no_location: u64,
    /// Beyond the grid edges or in a cell excluded by the domain mask.
    pub outside_grid: u64,
}

impl SpatialBinStats {
    pub fn merge(&mut self, other: &SpatialBinStats) {
        self.binned += other.binned;
        self.no_location += other.no_location;
        self.outside_grid += other.outside_grid;
    }
}

/// Accumulates events into a grid's count matrix.
#[derive(Debug, Clone)]
pub struct SpatialBinner {
    grid: BinningGrid,
    row_coords: Vec<f64>,
    column_coords: Vec<f64>,
    counts: CountMatrix,
}

impl SpatialBinner {
    pub fn new(grid: BinningGrid) -> Self {
        let row_coords = grid.spec.row_coords();
        let column_coords = grid.spec.column_coords();
        let counts = CountMatrix::for_grid(&grid.spec);
        Self {
            grid,
            row_coords,
            column_coords,
            counts,
        }
    }

    pub fn grid(&self) -> &BinningGrid {
        &self.grid
    }

    pub fn counts(&self) -> &CountMatrix {
        &self.counts
    }

    pub fn into_counts(self) -> CountMatrix {
        self.counts
    }

    /// Grid coordinates of an event: `(row_value, column_value)`.
    ///
    /// Lat/lng grids use the event location with the longitude converted to
    /// the grid's convention. Projected grids use the row's x/y when
    /// present, else project the location.
    pub fn grid_coordinates(&self, event: &ClimatologyEvent) -> Option<(f64, f64)> {
        match self.grid.spec.kind {
            GridKind::LatLng => event.location.map(|loc| {
                (
                    loc.latitude_deg,
                    self.grid.spec.normalize_longitude(loc.longitude_deg),
                )
            }),
            GridKind::Projected => {
                if let Some((x, y)) = event.projected_xy {
                    return Some((y, x));
                }
                let projection = self.grid.projection.as_ref()?;
                let loc = event.location?;
                projection
                    .geo_to_xy(loc.latitude_deg, loc.longitude_deg)
                    .ok()
                    .map(|(x, y)| (y, x))
            }
        }
    }

    /// Cell of an event, or `None` when it has no location or falls
    /// outside the grid.
    pub fn locate(&self, event: &ClimatologyEvent) -> Option<(usize, usize)> {
        let (row_value, column_value) = self.grid_coordinates(event)?;
        assign_nearest(
            &self.row_coords,
            &self.column_coords,
            self.grid.spec.row_spacing,
            self.grid.spec.column_spacing,
            row_value,
            column_value,
        )
    }

    /// Add one count per located event.
    pub fn bin<'a, I>(&mut self, events: I) -> SpatialBinStats
    where
        I: IntoIterator<Item = &'a ClimatologyEvent>,
    {
        let mut stats = SpatialBinStats::default();
        for event in events {
            let Some(coords) = self.grid_coordinates(event) else {
                stats.no_location += 1;
                continue;
            };
            match assign_nearest(
                &self.row_coords,
                &self.column_coords,
                self.grid.spec.row_spacing,
                self.grid.spec.column_spacing,
                coords.0,
                coords.1,
            ) {
                Some((row, col)) if self.grid.spec.in_domain(row, col) => {
                    self.counts.increment(row, col);
                    stats.binned += 1;
                }
                _ => stats.outside_grid += 1,
            }
        }
        stats
    }
}
