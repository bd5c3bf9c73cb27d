//! Storm objects and per-date storm object tables.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{StormError, StormResult};
use crate::geometry::Polygon;

/// Well-known column names of a storm object table.
pub mod columns {
    pub const STORM_ID: &str = "storm_id";
    pub const VALID_TIME: &str = "unix_time_sec";
    pub const AGE: &str = "age_sec";
    pub const CENTROID_LAT: &str = "centroid_lat_deg";
    pub const CENTROID_LNG: &str = "centroid_lng_deg";
    pub const CENTROID_X: &str = "centroid_x_metres";
    pub const CENTROID_Y: &str = "centroid_y_metres";
    pub const POLYGON_LATLNG: &str = "polygon_object_latlng";
    pub const EAST_VELOCITY: &str = "east_velocity_m_s01";
    pub const NORTH_VELOCITY: &str = "north_velocity_m_s01";

    /// Columns every row must carry.
    pub const REQUIRED: [&str; 3] = [STORM_ID, VALID_TIME, AGE];

    /// Columns with a typed field on [`super::StormObject`].
    pub const TYPED: [&str; 10] = [
        STORM_ID,
        VALID_TIME,
        AGE,
        CENTROID_LAT,
        CENTROID_LNG,
        CENTROID_X,
        CENTROID_Y,
        POLYGON_LATLNG,
        EAST_VELOCITY,
        NORTH_VELOCITY,
    ];
}

/// One tracked storm at one valid time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormObject {
    /// Unique per storm lifetime, repeated across that storm's rows.
    pub storm_id: String,
    /// Valid time (Unix seconds, UTC).
    #[serde(rename = "unix_time_sec")]
    pub valid_time: i64,
    /// Seconds since the storm was first tracked. Monotonic within an ID.
    #[serde(rename = "age_sec")]
    pub age_seconds: i64,
    #[serde(rename = "centroid_lat_deg", default, skip_serializing_if = "Option::is_none")]
    pub centroid_lat: Option<f64>,
    #[serde(rename = "centroid_lng_deg", default, skip_serializing_if = "Option::is_none")]
    pub centroid_lng: Option<f64>,
    #[serde(rename = "centroid_x_metres", default, skip_serializing_if = "Option::is_none")]
    pub centroid_x: Option<f64>,
    #[serde(rename = "centroid_y_metres", default, skip_serializing_if = "Option::is_none")]
    pub centroid_y: Option<f64>,
    /// Footprint with (lng, lat) vertices.
    #[serde(rename = "polygon_object_latlng", default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Polygon>,
    #[serde(rename = "east_velocity_m_s01", default, skip_serializing_if = "Option::is_none")]
    pub east_velocity: Option<f64>,
    #[serde(rename = "north_velocity_m_s01", default, skip_serializing_if = "Option::is_none")]
    pub north_velocity: Option<f64>,
    /// Any other column, keyed by name. Absent values are JSON null.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl StormObject {
    /// Create a storm object with only the required columns.
    pub fn new(storm_id: impl Into<String>, valid_time: i64, age_seconds: i64) -> Self {
        Self {
            storm_id: storm_id.into(),
            valid_time,
            age_seconds,
            centroid_lat: None,
            centroid_lng: None,
            centroid_x: None,
            centroid_y: None,
            polygon: None,
            east_velocity: None,
            north_velocity: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_centroid(mut self, lat: f64, lng: f64) -> Self {
        self.centroid_lat = Some(lat);
        self.centroid_lng = Some(lng);
        self
    }

    pub fn with_projected_centroid(mut self, x: f64, y: f64) -> Self {
        self.centroid_x = Some(x);
        self.centroid_y = Some(y);
        self
    }

    pub fn with_polygon(mut self, polygon: Polygon) -> Self {
        self.polygon = Some(polygon);
        self
    }

    pub fn with_velocity(mut self, east: f64, north: f64) -> Self {
        self.east_velocity = Some(east);
        self.north_velocity = Some(north);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Build a row from a JSON object keyed by column name.
    pub fn from_json(row: Value) -> StormResult<Self> {
        let Value::Object(map) = &row else {
            return Err(StormError::invalid_column("<row>", "row is not a JSON object"));
        };
        for column in columns::REQUIRED {
            match map.get(column) {
                None | Some(Value::Null) => {
                    return Err(StormError::MissingColumn {
                        column: column.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(serde_json::from_value(row)?)
    }

    /// Best location estimate as `(lat, lng)`.
    ///
    /// The footprint's area-weighted centroid wins over the centroid
    /// columns; `None` when the row has neither.
    pub fn location(&self) -> Option<(f64, f64)> {
        if let Some((lng, lat)) = self.polygon.as_ref().and_then(Polygon::centroid) {
            return Some((lat, lng));
        }
        match (self.centroid_lat, self.centroid_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Speed from the velocity components, if both are present.
    pub fn speed_m_s(&self) -> Option<f64> {
        match (self.east_velocity, self.north_velocity) {
            (Some(u), Some(v)) => Some((u * u + v * v).sqrt()),
            _ => None,
        }
    }

    fn has_column(&self, column: &str) -> bool {
        match column {
            columns::STORM_ID | columns::VALID_TIME | columns::AGE => true,
            columns::CENTROID_LAT => self.centroid_lat.is_some(),
            columns::CENTROID_LNG => self.centroid_lng.is_some(),
            columns::CENTROID_X => self.centroid_x.is_some(),
            columns::CENTROID_Y => self.centroid_y.is_some(),
            columns::POLYGON_LATLNG => self.polygon.is_some(),
            columns::EAST_VELOCITY => self.east_velocity.is_some(),
            columns::NORTH_VELOCITY => self.north_velocity.is_some(),
            other => self.attributes.contains_key(other),
        }
    }
}

/// An ordered table of storm objects for one or more SPC dates.
///
/// Column names are kept separately from the rows so that tables with
/// different schemas can be aligned before concatenation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StormTable {
    columns: Vec<String>,
    rows: Vec<StormObject>,
}

impl StormTable {
    /// An empty table with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table whose columns are inferred from the rows, required
    /// columns first, then typed columns, then attributes in first-seen order.
    pub fn from_rows(rows: Vec<StormObject>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        if !rows.is_empty() {
            for column in columns::TYPED {
                if rows.iter().any(|r| r.has_column(column)) {
                    columns.push(column.to_string());
                }
            }
            for row in &rows {
                for name in row.attributes.keys() {
                    if !columns.iter().any(|c| c == name) {
                        columns.push(name.clone());
                    }
                }
            }
        }
        Self { columns, rows }
    }

    /// Build a table with an explicit column list.
    ///
    /// Declared columns missing from a row are null-filled.
    pub fn with_columns(columns: Vec<String>, rows: Vec<StormObject>) -> Self {
        let mut table = Self { columns: Vec::new(), rows };
        for column in columns::REQUIRED {
            if !table.rows.is_empty() && !columns.iter().any(|c| c == column) {
                table.columns.push(column.to_string());
            }
        }
        table.columns.extend(columns);
        let all = table.columns.clone();
        table.align_to(&all);
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StormObject] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Extend this table's schema to `columns`, null-filling every
    /// column the rows do not carry.
    ///
    /// Existing columns are never dropped; columns only present in `self`
    /// stay at the end.
    pub fn align_to(&mut self, columns: &[String]) {
        let mut merged: Vec<String> = columns.to_vec();
        for existing in &self.columns {
            if !merged.contains(existing) {
                merged.push(existing.clone());
            }
        }

        for column in &merged {
            if columns::TYPED.contains(&column.as_str()) {
                // Typed columns are Option fields; absence already reads as null.
                continue;
            }
            for row in &mut self.rows {
                row.attributes.entry(column.clone()).or_insert(Value::Null);
            }
        }

        self.columns = merged;
    }

    /// Append rows from a table with the same schema.
    pub fn append(&mut self, other: StormTable) {
        if self.columns.is_empty() {
            self.columns = other.columns;
        }
        self.rows.extend(other.rows);
    }

    /// Keep only rows for which `keep` returns true, preserving order.
    pub fn retain<F: FnMut(&StormObject) -> bool>(&mut self, keep: F) {
        self.rows.retain(keep);
    }
}
