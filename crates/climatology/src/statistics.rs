//! Per-storm track statistics.
//!
//! Collected alongside the climatology for the storms whose event survived
//! classification: lifetime at death, distance travelled, mean speed and
//! largest footprint area.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use storm_common::{haversine_km, StormObject, StormTable};

use crate::classify::ClimatologyEvent;
use crate::window::ClimatologyMode;

/// Summary of one statistic series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize a series. `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            count: n,
            mean,
            std_dev: variance.sqrt(),
            median,
            min: sorted[0],
            max: sorted[n - 1],
        })
    }
}

/// Summaries of every collected series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub storms: usize,
    pub lifetime_seconds: Option<Summary>,
    pub distance_travelled_km: Option<Summary>,
    pub mean_speed_m_s: Option<Summary>,
    pub max_area_km2: Option<Summary>,
}

/// Raw per-storm values, accumulated across windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsAccumulator {
    storms: usize,
    lifetime_seconds: Vec<f64>,
    distance_travelled_km: Vec<f64>,
    mean_speed_m_s: Vec<f64>,
    max_area_km2: Vec<f64>,
}

impl StatisticsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the storms of `events` using their rows in `table`.
    pub fn collect(
        &mut self,
        table: &StormTable,
        events: &[ClimatologyEvent],
        mode: ClimatologyMode,
    ) {
        if mode == ClimatologyMode::Death {
            self.lifetime_seconds
                .extend(events.iter().map(|e| e.age_seconds as f64));
        }

        let mut storm_ids: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for event in events {
            if seen.insert(event.storm_id.as_str()) {
                storm_ids.push(event.storm_id.as_str());
            }
        }

        let mut tracks: HashMap<&str, Vec<&StormObject>> = HashMap::new();
        for row in table.rows() {
            if seen.contains(row.storm_id.as_str()) {
                tracks.entry(row.storm_id.as_str()).or_default().push(row);
            }
        }

        for id in storm_ids {
            self.storms += 1;
            let Some(rows) = tracks.get(id) else {
                continue;
            };

            if let Some(distance) = distance_travelled_km(rows) {
                self.distance_travelled_km.push(distance);
            }

            let speeds: Vec<f64> = rows.iter().filter_map(|r| r.speed_m_s()).collect();
            if !speeds.is_empty() {
                self.mean_speed_m_s
                    .push(speeds.iter().sum::<f64>() / speeds.len() as f64);
            }

            let max_area = rows
                .iter()
                .filter_map(|r| r.polygon.as_ref())
                .map(|p| p.area_km2())
                .fold(None, |acc: Option<f64>, a| Some(acc.map_or(a, |m| m.max(a))));
            if let Some(area) = max_area {
                self.max_area_km2.push(area);
            }
        }
    }

    /// Append another accumulator's values.
    pub fn merge(&mut self, other: &StatisticsAccumulator) {
        self.storms += other.storms;
        self.lifetime_seconds.extend_from_slice(&other.lifetime_seconds);
        self.distance_travelled_km
            .extend_from_slice(&other.distance_travelled_km);
        self.mean_speed_m_s.extend_from_slice(&other.mean_speed_m_s);
        self.max_area_km2.extend_from_slice(&other.max_area_km2);
    }

    pub fn storms(&self) -> usize {
        self.storms
    }

    pub fn report(&self) -> StatisticsReport {
        StatisticsReport {
            storms: self.storms,
            lifetime_seconds: Summary::from_values(&self.lifetime_seconds),
            distance_travelled_km: Summary::from_values(&self.distance_travelled_km),
            mean_speed_m_s: Summary::from_values(&self.mean_speed_m_s),
            max_area_km2: Summary::from_values(&self.max_area_km2),
        }
    }
}

/// Great-circle distance between a track's first and last located rows.
fn distance_travelled_km(rows: &[&StormObject]) -> Option<f64> {
    let first = rows.iter().find_map(|r| r.location())?;
    let last = rows.iter().rev().find_map(|r| r.location())?;
    Some(haversine_km(first.1, first.0, last.1, last.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, ClassifierOptions};
    use storm_common::Polygon;

    #[test]
    fn test_summary() {
        let s = Summary::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.std_dev - 1.118_033_988_749_895).abs() < 1e-12);

        let odd = Summary::from_values(&[5.0, 1.0, 3.0]).unwrap();
        assert_eq!(odd.median, 3.0);
        assert!(Summary::from_values(&[]).is_none());
    }

    fn track() -> StormTable {
        let square = |lng: f64| {
            Polygon::from_pairs(&[(lng, 35.0), (lng + 0.1, 35.0), (lng + 0.1, 35.1), (lng, 35.1)])
        };
        StormTable::from_rows(vec![
            StormObject::new("a", 0, 900)
                .with_centroid(35.0, 260.0)
                .with_velocity(3.0, 4.0),
            StormObject::new("b", 0, 900).with_centroid(40.0, 270.0),
            StormObject::new("a", 300, 1200)
                .with_centroid(36.0, 260.0)
                .with_velocity(6.0, 8.0)
                .with_polygon(square(260.0)),
            StormObject::new("a", 600, 1500).with_polygon(square(261.0)),
        ])
    }

    #[test]
    fn test_death_statistics() {
        let table = track();
        let events = classify(&table, ClimatologyMode::Death, ClassifierOptions::default());
        let mut stats = StatisticsAccumulator::new();
        stats.collect(&table, &events, ClimatologyMode::Death);
        let report = stats.report();

        assert_eq!(report.storms, 2);
        let lifetimes = report.lifetime_seconds.unwrap();
        assert_eq!(lifetimes.count, 2);
        assert_eq!(lifetimes.max, 1500.0);
        assert_eq!(lifetimes.min, 900.0);

        // Only storm "a" has velocities: mean of 5 and 10
        let speed = report.mean_speed_m_s.unwrap();
        assert_eq!(speed.count, 1);
        assert!((speed.mean - 7.5).abs() < 1e-12);

        // "b" has one row, so zero distance; "a" moves about 1 degree east
        let distance = report.distance_travelled_km.unwrap();
        assert_eq!(distance.count, 2);
        assert_eq!(distance.min, 0.0);
        assert!(distance.max > 80.0 && distance.max < 100.0);

        let area = report.max_area_km2.unwrap();
        assert_eq!(area.count, 1);
        assert!(area.max > 90.0 && area.max < 110.0);
    }

    #[test]
    fn test_birth_has_no_lifetimes() {
        let table = track();
        let events = classify(&table, ClimatologyMode::Birth, ClassifierOptions::default());
        let mut stats = StatisticsAccumulator::new();
        stats.collect(&table, &events, ClimatologyMode::Birth);
        assert!(stats.report().lifetime_seconds.is_none());
    }

    #[test]
    fn test_merge() {
        let table = track();
        let events = classify(&table, ClimatologyMode::Death, ClassifierOptions::default());
        let mut a = StatisticsAccumulator::new();
        a.collect(&table, &events, ClimatologyMode::Death);
        let mut b = a.clone();
        b.merge(&a);
        assert_eq!(b.storms(), 4);
        assert_eq!(b.report().lifetime_seconds.unwrap().count, 4);
    }
}
