//! Straight-line synthetic tracks and per-date bucketing.
//!
//! Tracks are straight lines with a fixed time step. Rows are bucketed into
//! the UTC calendar day of their valid time, so a storm that starts late in
//! the evening spills into the next date's table.

use chrono::NaiveTime;
use storm_common::{DateRange, Polygon, SpcDate, StormObject, StormTable};

use climatology::MemoryTrackStore;

/// Half-width in degrees of the square footprint drawn around each centroid.
const FOOTPRINT_HALF_WIDTH_DEG: f64 = 0.05;

/// Description of one straight-line synthetic track.
#[derive(Debug, Clone)]
pub struct TrackSpec {
    pub storm_id: String,
    pub start_time: i64,
    pub steps: usize,
    pub step_seconds: i64,
    pub start_lat: f64,
    pub start_lng: f64,
    pub lat_step: f64,
    pub lng_step: f64,
    pub with_polygon: bool,
}

impl TrackSpec {
    pub fn new(storm_id: impl Into<String>, start_time: i64, steps: usize) -> Self {
        Self {
            storm_id: storm_id.into(),
            start_time,
            steps,
            step_seconds: 300,
            start_lat: 35.0,
            start_lng: 262.0,
            lat_step: 0.01,
            lng_step: 0.02,
            with_polygon: false,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.start_lat = lat;
        self.start_lng = lng;
        self
    }

    pub fn moving(mut self, lat_step: f64, lng_step: f64) -> Self {
        self.lat_step = lat_step;
        self.lng_step = lng_step;
        self
    }

    pub fn with_polygon(mut self) -> Self {
        self.with_polygon = true;
        self
    }

    /// Rows of the track, oldest first. Age starts at zero.
    pub fn rows(&self) -> Vec<StormObject> {
        (0..self.steps)
            .map(|i| {
                let lat = self.start_lat + i as f64 * self.lat_step;
                let lng = self.start_lng + i as f64 * self.lng_step;
                let age = i as i64 * self.step_seconds;
                // metres per second from degrees per step, ~111 km per degree
                let east = self.lng_step * 111_000.0 * lat.to_radians().cos() / self.step_seconds as f64;
                let north = self.lat_step * 111_000.0 / self.step_seconds as f64;

                let mut row = StormObject::new(self.storm_id.clone(), self.start_time + age, age)
                    .with_centroid(lat, lng)
                    .with_velocity(east, north);
                if self.with_polygon {
                    row = row.with_polygon(square_footprint(lat, lng));
                }
                row
            })
            .collect()
    }
}

fn square_footprint(lat: f64, lng: f64) -> Polygon {
    let h = FOOTPRINT_HALF_WIDTH_DEG;
    Polygon::from_pairs(&[
        (lng - h, lat - h),
        (lng + h, lat - h),
        (lng + h, lat + h),
        (lng - h, lat + h),
    ])
}

/// Unix time of 00:00 UTC on `date`.
pub fn date_start_time(date: SpcDate) -> i64 {
    date.as_naive().and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Bucket track rows into per-date tables and load them into a store.
///
/// Each date's table is ordered by valid time; rows outside the range
/// are dropped. Dates with no rows get no files.
pub fn store_from_tracks(dates: &DateRange, tracks: &[Vec<StormObject>]) -> MemoryTrackStore {
    let store = MemoryTrackStore::new();
    for (_, date) in dates.iter() {
        let start = date_start_time(date);
        let end = start + 86_400;
        let mut rows: Vec<StormObject> = tracks
            .iter()
            .flatten()
            .filter(|row| (start..end).contains(&row.valid_time))
            .cloned()
            .collect();
        if rows.is_empty() {
            continue;
        }
        rows.sort_by_key(|row| row.valid_time);
        store.insert(date, StormTable::from_rows(rows));
    }
    store
}
