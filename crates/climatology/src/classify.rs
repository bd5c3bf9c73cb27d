//! Event classification.
//!
//! Turns a stitched, mature-only table into the events a climatology
//! counts: the first row of each storm (birth), the last row (death), or
//! every row (passage).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use storm_common::{
    is_valid_latitude, is_valid_longitude, storm_hour_key, StormObject, StormTable,
};
use tracing::debug;

use crate::window::ClimatologyMode;

/// Geographic location of an event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

/// One birth, death or passage of a storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyEvent {
    pub storm_id: String,
    /// Valid time of the row the event came from (Unix seconds).
    pub event_time: i64,
    pub age_seconds: i64,
    /// Footprint centroid, else the centroid columns.
    pub location: Option<EventLocation>,
    /// Projected centroid `(x, y)` in metres, when the row carries one.
    pub projected_xy: Option<(f64, f64)>,
}

impl ClimatologyEvent {
    pub fn from_row(row: &StormObject) -> Self {
        // Non-finite or out-of-range coordinates count as no location
        let location = row
            .location()
            .filter(|&(lat, lng)| is_valid_latitude(lat) && is_valid_longitude(lng))
            .map(|(lat, lng)| EventLocation {
                latitude_deg: lat,
                longitude_deg: lng,
            });
        let projected_xy = match (row.centroid_x, row.centroid_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        };
        Self {
            storm_id: row.storm_id.clone(),
            event_time: row.valid_time,
            age_seconds: row.age_seconds,
            location,
            projected_xy,
        }
    }
}

/// Classification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifierOptions {
    /// Trailing-window length in seconds; `None` disables the filter.
    pub trailing_window_seconds: Option<i64>,
    /// In passage mode, keep one event per storm per UTC hour.
    pub once_per_hour: bool,
}

/// Extract events of `mode` from a stitched table.
///
/// Output order is not part of the contract.
pub fn classify(
    table: &StormTable,
    mode: ClimatologyMode,
    options: ClassifierOptions,
) -> Vec<ClimatologyEvent> {
    let candidates: Vec<&StormObject> = match mode {
        ClimatologyMode::Birth => first_per_storm(table.rows().iter()),
        ClimatologyMode::Death => first_per_storm(table.rows().iter().rev()),
        ClimatologyMode::Passage if options.once_per_hour => once_per_storm_hour(table.rows()),
        ClimatologyMode::Passage => table.rows().iter().collect(),
    };

    let mut events: Vec<ClimatologyEvent> =
        candidates.into_iter().map(ClimatologyEvent::from_row).collect();

    if let Some(window) = options.trailing_window_seconds {
        let before = events.len();
        events = trailing_window_filter(events, window);
        debug!(
            mode = %mode,
            candidates = before,
            kept = events.len(),
            window_seconds = window,
            "Applied trailing-window filter"
        );
    }

    events
}

/// First row of each distinct storm ID in iteration order.
///
/// Iterating a table in reverse gives the last row of each storm.
pub fn first_per_storm<'a, I>(rows: I) -> Vec<&'a StormObject>
where
    I: IntoIterator<Item = &'a StormObject>,
{
    let mut seen: HashSet<&str> = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.storm_id.as_str()))
        .collect()
}

/// First row of each distinct `"{storm_id}_{HH}"` key.
pub fn once_per_storm_hour(rows: &[StormObject]) -> Vec<&StormObject> {
    let mut seen: HashSet<String> = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(storm_hour_key(&row.storm_id, row.valid_time)))
        .collect()
}

/// Keep events with `max_time - window <= event_time <= max_time`, where
/// `max_time` is the latest event time in `events`.
pub fn trailing_window_filter(
    events: Vec<ClimatologyEvent>,
    window_seconds: i64,
) -> Vec<ClimatologyEvent> {
    let Some(max_time) = events.iter().map(|e| e.event_time).max() else {
        return events;
    };
    let min_time = max_time.saturating_sub(window_seconds);
    events
        .into_iter()
        .filter(|e| (min_time..=max_time).contains(&e.event_time))
        .collect()
}
