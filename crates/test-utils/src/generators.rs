//! Deterministic multi-day track sets.

use storm_common::{DateRange, StormObject};

use crate::tracks::{date_start_time, TrackSpec};

/// A deterministic season of tracks: `storms_per_day` storms starting on
/// each date, spread across the day and the CONUS domain.
pub fn synthetic_season(dates: &DateRange, storms_per_day: usize) -> Vec<Vec<StormObject>> {
    let mut tracks = Vec::new();
    for (day, date) in dates.iter() {
        let start = date_start_time(date);
        for n in 0..storms_per_day {
            let k = day * storms_per_day + n;
            // Spread start times over the day, some late enough to cross midnight
            let offset = ((k * 7_919) % 288) as i64 * 300;
            let steps = 3 + (k * 31) % 40;
            let lat = 25.0 + ((k * 13) % 250) as f64 * 0.1;
            let lng = 240.0 + ((k * 17) % 500) as f64 * 0.1;
            let spec = TrackSpec::new(format!("{}_{:04}", date, n), start + offset, steps)
                .at(lat, lng)
                .moving(0.005 * ((k % 5) as f64 - 2.0), 0.03);
            let spec = if k % 3 == 0 { spec.with_polygon() } else { spec };
            tracks.push(spec.rows());
        }
    }
    tracks
}
