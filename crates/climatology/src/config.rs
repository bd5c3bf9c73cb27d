//! Configuration for a climatology run.

use projection::AzimuthalEquidistant;
use serde::{Deserialize, Serialize};
use storm_common::{DateRange, GridSpec, SpcDate};

use crate::binning::assign_nearest;
use crate::error::{ClimatologyError, Result};
use crate::window::ClimatologyMode;

/// Default tracking source tag.
pub const DEFAULT_SOURCE: &str = "segmotion";

/// Default tracking scale (m²), the storm-area threshold of the tracker.
pub const DEFAULT_TRACKING_SCALE_M2: u64 = 314_159_265;

/// Configuration for a climatology run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimatologyConfig {
    /// First SPC date of the run (inclusive).
    pub first_date: Option<SpcDate>,

    /// Last SPC date of the run (inclusive).
    pub last_date: Option<SpcDate>,

    /// Which event to count.
    pub mode: ClimatologyMode,

    /// Rows younger than this are dropped before classification.
    pub min_age_seconds: i64,

    /// Grid for spatial binning. `None` disables the spatial climatology.
    pub grid: Option<GridDefinition>,

    /// Length of the trailing-window filter.
    pub trailing_window_seconds: i64,

    /// Which modes apply the trailing-window filter.
    pub trailing_filter: TrailingFilter,

    /// In passage mode, count each storm at most once per UTC hour.
    pub passage_once_per_hour: bool,

    /// Tracking source tag used to locate files.
    pub source: String,

    /// Tracking scale (m²) used to locate files.
    pub tracking_scale_m2: u64,

    /// Collect per-storm statistics.
    pub collect_statistics: bool,
}

impl Default for ClimatologyConfig {
    fn default() -> Self {
        Self {
            first_date: None,
            last_date: None,
            mode: ClimatologyMode::default(),
            min_age_seconds: 900,
            grid: None,
            trailing_window_seconds: 86_400,
            trailing_filter: TrailingFilter::default(),
            passage_once_per_hour: false,
            source: DEFAULT_SOURCE.to_string(),
            tracking_scale_m2: DEFAULT_TRACKING_SCALE_M2,
            collect_statistics: false,
        }
    }
}

impl ClimatologyConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults; bad dates are
    /// caught by [`validate`](Self::validate).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CLIMATOLOGY_FIRST_DATE") {
            config.first_date = SpcDate::parse(&val).ok();
        }

        if let Ok(val) = std::env::var("CLIMATOLOGY_LAST_DATE") {
            config.last_date = SpcDate::parse(&val).ok();
        }

        if let Ok(val) = std::env::var("CLIMATOLOGY_MODE") {
            if let Ok(mode) = val.parse() {
                config.mode = mode;
            }
        }

        if let Ok(val) = std::env::var("MIN_STORM_AGE_SEC") {
            if let Ok(age) = val.parse() {
                config.min_age_seconds = age;
            }
        }

        if let Ok(val) = std::env::var("TRAILING_WINDOW_SEC") {
            if let Ok(window) = val.parse() {
                config.trailing_window_seconds = window;
            }
        }

        if let Ok(val) = std::env::var("PASSAGE_ONCE_PER_HOUR") {
            config.passage_once_per_hour = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("TRACKING_SOURCE") {
            config.source = val;
        }

        if let Ok(val) = std::env::var("TRACKING_SCALE_M2") {
            if let Ok(scale) = val.parse() {
                config.tracking_scale_m2 = scale;
            }
        }

        if let Ok(val) = std::env::var("COLLECT_STATISTICS") {
            config.collect_statistics = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.date_range().map_err(|e| e.to_string())?;

        if self.min_age_seconds < 0 {
            return Err("min_age_seconds must be >= 0".to_string());
        }

        if self.trailing_window_seconds < 0 {
            return Err("trailing_window_seconds must be >= 0".to_string());
        }

        if self.source.trim().is_empty() {
            return Err("source must not be empty".to_string());
        }

        if self.tracking_scale_m2 == 0 {
            return Err("tracking_scale_m2 must be > 0".to_string());
        }

        if let Some(grid) = &self.grid {
            grid.build().map_err(|e| e.to_string())?;
        }

        Ok(())
    }

    /// The inclusive range of SPC dates to process.
    pub fn date_range(&self) -> Result<DateRange> {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => Ok(DateRange::new(first, last)?),
            (None, _) => Err(ClimatologyError::configuration("first_date is required")),
            (_, None) => Err(ClimatologyError::configuration("last_date is required")),
        }
    }

    /// Whether the trailing-window filter applies to the configured mode.
    pub fn trailing_filter_enabled(&self) -> bool {
        self.trailing_filter.applies_to(self.mode)
    }
}

/// Per-mode switches for the trailing-window filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailingFilter {
    pub birth: bool,
    pub death: bool,
    pub passage: bool,
}

impl Default for TrailingFilter {
    fn default() -> Self {
        Self {
            birth: true,
            death: true,
            passage: false,
        }
    }
}

impl TrailingFilter {
    pub fn applies_to(&self, mode: ClimatologyMode) -> bool {
        match mode {
            ClimatologyMode::Birth => self.birth,
            ClimatologyMode::Death => self.death,
            ClimatologyMode::Passage => self.passage,
        }
    }
}

// ============================================================================
// Grid Configuration
// ============================================================================

/// A regular lat/lng domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngDomain {
    pub min_latitude_deg: f64,
    pub min_longitude_deg: f64,
    pub latitude_spacing_deg: f64,
    pub longitude_spacing_deg: f64,
    pub num_rows: usize,
    pub num_columns: usize,
    /// Irregular study domain, one row of flags per grid row (row 0
    /// southernmost). `false` cells are reported as outside the domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_mask: Option<Vec<Vec<bool>>>,
}

impl LatLngDomain {
    pub fn to_grid(&self) -> Result<GridSpec> {
        let grid = GridSpec::latlng(
            self.min_latitude_deg,
            self.min_longitude_deg,
            self.latitude_spacing_deg,
            self.longitude_spacing_deg,
            self.num_rows,
            self.num_columns,
        )?;
        let Some(rows) = &self.domain_mask else {
            return Ok(grid);
        };

        if rows.len() != self.num_rows || rows.iter().any(|r| r.len() != self.num_columns) {
            return Err(ClimatologyError::configuration(format!(
                "domain_mask must be {} rows of {} flags",
                self.num_rows, self.num_columns
            )));
        }
        Ok(grid.with_domain_mask(rows.concat())?)
    }
}

/// Carry a lat/lng domain mask over to a projected grid.
///
/// An x/y cell is inside the domain when its centre falls in an unmasked
/// lat/lng cell.
fn project_domain_mask(
    latlng: &GridSpec,
    projection: &AzimuthalEquidistant,
    xy: &GridSpec,
) -> Vec<bool> {
    let lat_coords = latlng.row_coords();
    let lng_coords = latlng.column_coords();
    let x_coords = xy.column_coords();

    let mut mask = Vec::with_capacity(xy.len());
    for y in xy.row_coords() {
        for &x in &x_coords {
            let (lat, lng) = projection.xy_to_geo(x, y);
            let inside = assign_nearest(
                &lat_coords,
                &lng_coords,
                latlng.row_spacing,
                latlng.column_spacing,
                lat,
                latlng.normalize_longitude(lng),
            )
            .is_some_and(|(row, col)| latlng.in_domain(row, col));
            mask.push(inside);
        }
    }
    mask
}

/// Grid used for the spatial climatology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridDefinition {
    /// Bin directly on a lat/lng grid.
    LatLng(LatLngDomain),
    /// Bin on an x/y grid that covers a lat/lng domain under an azimuthal
    /// equidistant projection centred on the domain.
    Projected {
        domain: LatLngDomain,
        x_spacing_metres: f64,
        y_spacing_metres: f64,
    },
}

impl GridDefinition {
    /// Build the grid and, for projected grids, its projection.
    pub fn build(&self) -> Result<BinningGrid> {
        match self {
            GridDefinition::LatLng(domain) => Ok(BinningGrid {
                spec: domain.to_grid()?,
                projection: None,
            }),
            GridDefinition::Projected {
                domain,
                x_spacing_metres,
                y_spacing_metres,
            } => {
                let latlng = domain.to_grid()?;
                let projection = AzimuthalEquidistant::centered_on(&latlng)?;
                let mut spec =
                    projection.covering_grid(&latlng, *x_spacing_metres, *y_spacing_metres)?;
                if latlng.domain_mask.is_some() {
                    let mask = project_domain_mask(&latlng, &projection, &spec);
                    spec = spec.with_domain_mask(mask)?;
                }
                Ok(BinningGrid {
                    spec,
                    projection: Some(projection),
                })
            }
        }
    }
}

/// A built grid ready for binning.
#[derive(Debug, Clone, PartialEq)]
pub struct BinningGrid {
    pub spec: GridSpec,
    /// Present for projected grids.
    pub projection: Option<AzimuthalEquidistant>,
}

impl BinningGrid {
    pub fn latlng(spec: GridSpec) -> Self {
        Self {
            spec,
            projection: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ClimatologyConfig {
        ClimatologyConfig {
            first_date: Some(SpcDate::parse("20110401").unwrap()),
            last_date: Some(SpcDate::parse("20110407").unwrap()),
            ..Default::default()
        }
    }

    fn small_domain() -> LatLngDomain {
        LatLngDomain {
            min_latitude_deg: 30.0,
            min_longitude_deg: -100.0,
            latitude_spacing_deg: 1.0,
            longitude_spacing_deg: 1.0,
            num_rows: 5,
            num_columns: 5,
            domain_mask: None,
        }
    }

    /// Unmasked everywhere except the western two columns.
    fn eastern_mask() -> Vec<Vec<bool>> {
        vec![vec![false, false, true, true, true]; 5]
    }

    #[test]
    fn test_default_config() {
        let config = ClimatologyConfig::default();
        assert_eq!(config.mode, ClimatologyMode::Passage);
        assert_eq!(config.min_age_seconds, 900);
        assert_eq!(config.trailing_window_seconds, 86_400);
        assert!(config.trailing_filter.birth);
        assert!(config.trailing_filter.death);
        assert!(!config.trailing_filter.passage);
        assert!(!config.passage_once_per_hour);
        assert_eq!(config.source, "segmotion");
        assert_eq!(config.tracking_scale_m2, 314_159_265);
        assert!(!config.collect_statistics);
        assert!(config.grid.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.first_date = None;
        assert!(config.validate().is_err());

        config = base_config();
        config.last_date = Some(SpcDate::parse("20110301").unwrap());
        assert!(config.validate().is_err());

        config = base_config();
        config.min_age_seconds = -1;
        assert!(config.validate().is_err());

        config = base_config();
        config.tracking_scale_m2 = 0;
        assert!(config.validate().is_err());

        config = base_config();
        let mut domain = small_domain();
        domain.latitude_spacing_deg = 0.0;
        config.grid = Some(GridDefinition::LatLng(domain));
        assert!(config.validate().is_err());

        config = base_config();
        let mut domain = small_domain();
        domain.num_columns = 0;
        config.grid = Some(GridDefinition::LatLng(domain));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trailing_filter_per_mode() {
        let mut config = base_config();
        config.mode = ClimatologyMode::Birth;
        assert!(config.trailing_filter_enabled());
        config.mode = ClimatologyMode::Passage;
        assert!(!config.trailing_filter_enabled());
        config.trailing_filter.passage = true;
        assert!(config.trailing_filter_enabled());
    }

    #[test]
    fn test_grid_definition_from_json() {
        let json = r#"{
            "type": "lat_lng",
            "min_latitude_deg": 20.0,
            "min_longitude_deg": 230.0,
            "latitude_spacing_deg": 0.1,
            "longitude_spacing_deg": 0.1,
            "num_rows": 351,
            "num_columns": 701
        }"#;
        let def: GridDefinition = serde_json::from_str(json).unwrap();
        let grid = def.build().unwrap();
        assert_eq!(grid.spec.num_rows, 351);
        assert!(grid.projection.is_none());
    }

    #[test]
    fn test_non_integer_row_count_rejected() {
        let json = r#"{
            "type": "lat_lng",
            "min_latitude_deg": 20.0,
            "min_longitude_deg": 230.0,
            "latitude_spacing_deg": 0.1,
            "longitude_spacing_deg": 0.1,
            "num_rows": 35.5,
            "num_columns": 701
        }"#;
        assert!(serde_json::from_str::<GridDefinition>(json).is_err());
    }

    #[test]
    fn test_projected_grid_definition() {
        let def = GridDefinition::Projected {
            domain: small_domain(),
            x_spacing_metres: 10_000.0,
            y_spacing_metres: 10_000.0,
        };
        let grid = def.build().unwrap();
        assert!(grid.projection.is_some());
        assert_eq!(grid.spec.kind, storm_common::GridKind::Projected);
        assert_eq!(grid.spec.column_spacing, 10_000.0);
    }

    #[test]
    fn test_domain_mask_applied_to_latlng_grid() {
        let mut domain = small_domain();
        domain.domain_mask = Some(eastern_mask());
        let grid = GridDefinition::LatLng(domain).build().unwrap();
        assert!(!grid.spec.in_domain(0, 0));
        assert!(!grid.spec.in_domain(4, 1));
        assert!(grid.spec.in_domain(4, 2));
    }

    #[test]
    fn test_domain_mask_shape_mismatch_rejected() {
        let mut domain = small_domain();
        domain.domain_mask = Some(vec![vec![true; 5]; 4]);
        assert!(matches!(
            domain.to_grid(),
            Err(ClimatologyError::Configuration(_))
        ));

        let mut ragged = eastern_mask();
        ragged[2].pop();
        domain.domain_mask = Some(ragged);
        assert!(domain.to_grid().is_err());

        let mut config = base_config();
        config.grid = Some(GridDefinition::LatLng(domain));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_domain_mask_from_json() {
        let json = r#"{
            "type": "lat_lng",
            "min_latitude_deg": 30.0,
            "min_longitude_deg": 260.0,
            "latitude_spacing_deg": 1.0,
            "longitude_spacing_deg": 1.0,
            "num_rows": 2,
            "num_columns": 3,
            "domain_mask": [[true, true, false], [true, false, false]]
        }"#;
        let grid = serde_json::from_str::<GridDefinition>(json).unwrap().build().unwrap();
        assert_eq!(
            grid.spec.domain_mask,
            Some(vec![true, true, false, true, false, false])
        );
    }

    #[test]
    fn test_domain_mask_carried_to_projected_grid() {
        let mut domain = small_domain();
        domain.domain_mask = Some(eastern_mask());
        let grid = GridDefinition::Projected {
            domain,
            x_spacing_metres: 20_000.0,
            y_spacing_metres: 20_000.0,
        }
        .build()
        .unwrap();

        let spec = &grid.spec;
        let mask = spec.domain_mask.as_ref().unwrap();
        assert_eq!(mask.len(), spec.len());
        // The western edge of the projected grid lies in masked lat/lng cells,
        // the eastern edge in unmasked ones
        let mid = spec.num_rows / 2;
        assert!(!spec.in_domain(mid, 0));
        assert!(spec.in_domain(mid, spec.num_columns - 1));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: ClimatologyConfig =
            serde_json::from_str(r#"{"first_date": "20110427", "last_date": "20110428", "mode": "birth"}"#)
                .unwrap();
        assert_eq!(config.mode, ClimatologyMode::Birth);
        assert_eq!(config.min_age_seconds, 900);
        assert_eq!(config.date_range().unwrap().len(), 2);
    }
}
