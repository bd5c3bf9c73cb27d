//! JSON report handed to the rendering side.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use climatology::{
    cell_report, BinningGrid, CellValue, ClimatologyMode, ClimatologyResult, StatisticsReport,
};
use serde::Serialize;
use storm_common::{DateRange, GridKind};

/// Complete output of one climatology run.
#[derive(Debug, Clone, Serialize)]
pub struct ClimatologyReport {
    pub mode: ClimatologyMode,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub dates_processed: usize,
    pub events: u64,
    /// Event counts per UTC hour, index 0 is 00 UTC.
    pub hour_histogram: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<GridReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsReport>,
}

/// Spatial counts with the coordinates needed to draw them.
#[derive(Debug, Clone, Serialize)]
pub struct GridReport {
    pub kind: GridKind,
    /// Latitudes (or y metres), row 0 southernmost.
    pub row_coords: Vec<f64>,
    /// Longitudes positive in west (or x metres).
    pub column_coords: Vec<f64>,
    pub num_rows: usize,
    pub num_columns: usize,
    /// `(lat, lng)` of the projection centre for projected grids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_center_deg: Option<(f64, f64)>,
    /// Counts, `null` for empty cells and `"outside"` for masked cells.
    pub cells: Vec<Vec<CellValue>>,
    pub binned: u64,
    pub no_location: u64,
    pub outside_grid: u64,
}

impl ClimatologyReport {
    pub fn build(result: &ClimatologyResult, dates: &DateRange, grid: Option<&BinningGrid>) -> Self {
        let grid_report = match (grid, &result.spatial_counts) {
            (Some(grid), Some(counts)) => Some(GridReport {
                kind: grid.spec.kind,
                row_coords: grid.spec.row_coords(),
                column_coords: grid.spec.column_coords(),
                num_rows: grid.spec.num_rows,
                num_columns: grid.spec.num_columns,
                projection_center_deg: grid
                    .projection
                    .map(|p| (p.lat0.to_degrees(), p.lon0.to_degrees())),
                cells: cell_report(counts, &grid.spec),
                binned: result.spatial_stats.binned,
                no_location: result.spatial_stats.no_location,
                outside_grid: result.spatial_stats.outside_grid,
            }),
            _ => None,
        };

        Self {
            mode: result.mode,
            first_date: dates.first().map(|d| d.to_string()),
            last_date: dates.last().map(|d| d.to_string()),
            dates_processed: result.dates_processed,
            events: result.events,
            hour_histogram: result.hour_histogram.counts().to_vec(),
            grid: grid_report,
            statistics: result.statistics.as_ref().map(|s| s.report()),
        }
    }
}

/// Write the report as pretty JSON to `path`, or to stdout when `None`.
pub fn write_report(report: &ClimatologyReport, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            let file =
                File::create(path).with_context(|| format!("Failed to create report {:?}", path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)
                .with_context(|| format!("Failed to write report {:?}", path))?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, report)
                .context("Failed to write report to stdout")?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use climatology::{ClimatologyConfig, ClimatologyRunner, GridDefinition, LatLngDomain};
    use storm_common::SpcDate;
    use test_utils::{store_from_tracks, synthetic_season};

    #[test]
    fn test_report_json_shape() {
        let dates = DateRange::parse("20110401", "20110402").unwrap();
        let store = store_from_tracks(&dates, &synthetic_season(&dates, 4));
        let config = ClimatologyConfig {
            first_date: Some(SpcDate::parse("20110401").unwrap()),
            last_date: Some(SpcDate::parse("20110402").unwrap()),
            mode: ClimatologyMode::Birth,
            grid: Some(GridDefinition::LatLng(LatLngDomain {
                min_latitude_deg: 20.0,
                min_longitude_deg: 230.0,
                latitude_spacing_deg: 1.0,
                longitude_spacing_deg: 1.0,
                num_rows: 36,
                num_columns: 71,
                domain_mask: None,
            })),
            collect_statistics: true,
            ..Default::default()
        };
        let runner = ClimatologyRunner::new(config).unwrap();
        let result = runner.run(&store).unwrap();
        let report = ClimatologyReport::build(&result, runner.dates(), runner.grid());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["mode"], "birth");
        assert_eq!(value["first_date"], "20110401");
        assert_eq!(value["hour_histogram"].as_array().unwrap().len(), 24);
        assert_eq!(value["grid"]["kind"], "lat_lng");
        assert_eq!(value["grid"]["cells"].as_array().unwrap().len(), 36);
        assert!(value["grid"].get("projection_center_deg").is_none());
        // Most cells are empty and masked as null
        assert!(value["grid"]["cells"][0][0].is_null());
        assert!(value["statistics"].is_object());
    }

    #[test]
    fn test_write_report_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out").join("report.json");
        let report = ClimatologyReport {
            mode: ClimatologyMode::Passage,
            first_date: None,
            last_date: None,
            dates_processed: 0,
            events: 0,
            hour_histogram: vec![0; 24],
            grid: None,
            statistics: None,
        };
        write_report(&report, Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mode"], "passage");
        assert!(value.get("grid").is_none());
    }
}
