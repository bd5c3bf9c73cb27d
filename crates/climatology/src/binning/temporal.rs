//! Hour-of-day histogram.

use serde::{Deserialize, Serialize};
use storm_common::{utc_hour_of_day, HOURS_PER_DAY};

use crate::classify::ClimatologyEvent;

/// Event counts per UTC hour of day, accumulated over a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HourHistogram {
    counts: [u64; HOURS_PER_DAY],
}

impl HourHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one count per event to its UTC hour bin.
    pub fn bin<'a, I>(&mut self, events: I) -> usize
    where
        I: IntoIterator<Item = &'a ClimatologyEvent>,
    {
        let mut binned = 0;
        for event in events {
            self.add_time(event.event_time);
            binned += 1;
        }
        binned
    }

    /// Add one count for a Unix timestamp.
    pub fn add_time(&mut self, unix_time_sec: i64) {
        self.counts[utc_hour_of_day(unix_time_sec)] += 1;
    }

    /// Elementwise addition.
    pub fn merge(&mut self, other: &HourHistogram) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    pub fn counts(&self) -> &[u64; HOURS_PER_DAY] {
        &self.counts
    }

    pub fn get(&self, hour: usize) -> Option<u64> {
        self.counts.get(hour).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storm_common::StormObject;

    fn event_at(t: i64) -> ClimatologyEvent {
        ClimatologyEvent::from_row(&StormObject::new("a", t, 1000))
    }

    #[test]
    fn test_hour_bins() {
        let mut hist = HourHistogram::new();
        // 2011-04-27 21:30 UTC
        let binned = hist.bin(&[event_at(1_303_939_800), event_at(0), event_at(3_599)]);
        assert_eq!(binned, 3);
        assert_eq!(hist.get(21), Some(1));
        assert_eq!(hist.get(0), Some(2));
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.get(24), None);
    }

    #[test]
    fn test_negative_timestamps() {
        let mut hist = HourHistogram::new();
        hist.add_time(-1);
        assert_eq!(hist.get(23), Some(1));
    }

    #[test]
    fn test_merge_is_additive() {
        let a_events = [event_at(0), event_at(7_200)];
        let b_events = [event_at(7_300), event_at(86_399)];

        let mut combined = HourHistogram::new();
        combined.bin(a_events.iter().chain(b_events.iter()));

        let mut a = HourHistogram::new();
        a.bin(&a_events);
        let mut b = HourHistogram::new();
        b.bin(&b_events);
        a.merge(&b);

        assert_eq!(a, combined);
        assert_eq!(a.get(2), Some(2));
        assert_eq!(a.get(23), Some(1));
    }

    #[test]
    fn test_serializes_as_array() {
        let mut hist = HourHistogram::new();
        hist.add_time(3_600);
        let json = serde_json::to_value(hist).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 24);
        assert_eq!(json[1], 1);
    }
}
