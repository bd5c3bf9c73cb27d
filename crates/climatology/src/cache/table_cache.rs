//! LRU cache of per-date storm tables.

use lru::LruCache;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use storm_common::{DateIndex, DateRange, SpcDate, StormTable};
use tracing::{debug, info, warn};

use crate::error::{ClimatologyError, Result};
use crate::store::TrackStore;
use crate::window::MAX_WINDOW_SIZE;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub loads: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn merge(&mut self, other: &CacheStats) {
        self.hits += other.hits;
        self.misses += other.misses;
        self.loads += other.loads;
        self.evictions += other.evictions;
        self.entries += other.entries;
    }
}

/// Storm tables for the dates of the current window, keyed by date index.
///
/// Capacity is the largest window size, so a date is read from the store
/// once per stretch of consecutive windows that contain it.
pub struct TrackTableCache {
    cache: LruCache<DateIndex, StormTable>,
    source: String,
    tracking_scale_m2: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    evictions: AtomicU64,
}

impl TrackTableCache {
    /// Create a cache sized for the largest window.
    pub fn new(source: impl Into<String>, tracking_scale_m2: u64) -> Self {
        Self::with_capacity(source, tracking_scale_m2, MAX_WINDOW_SIZE)
    }

    pub fn with_capacity(
        source: impl Into<String>,
        tracking_scale_m2: u64,
        capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            source: source.into(),
            tracking_scale_m2,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Drop every cached date not in `window`.
    ///
    /// Returns the SPC dates that were cleared.
    pub fn evict(&mut self, window: &BTreeSet<DateIndex>, dates: &DateRange) -> Vec<SpcDate> {
        let stale: Vec<DateIndex> = self
            .cache
            .iter()
            .map(|(index, _)| *index)
            .filter(|index| !window.contains(index))
            .collect();

        let mut cleared = Vec::with_capacity(stale.len());
        for index in stale {
            if self.cache.pop(&index).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                if let Some(date) = dates.get(index) {
                    cleared.push(date);
                }
            }
        }

        if !cleared.is_empty() {
            let cleared_str: Vec<String> = cleared.iter().map(|d| d.to_string()).collect();
            info!(cleared = ?cleared_str, "Cleared tracking data from cache");
        }
        cleared
    }

    /// Tables for every date in `window`, lowest index first.
    ///
    /// Dates not yet cached are read from `store`. A date with no tracking
    /// files yields an empty table.
    pub fn get_window_tables<S>(
        &mut self,
        window: &BTreeSet<DateIndex>,
        dates: &DateRange,
        store: &S,
    ) -> Result<Vec<&StormTable>>
    where
        S: TrackStore + ?Sized,
    {
        for &index in window {
            if self.cache.get(&index).is_some() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            self.misses.fetch_add(1, Ordering::Relaxed);

            let date = dates.get(index).ok_or_else(|| {
                ClimatologyError::configuration(format!(
                    "date index {} is outside the {}-date range",
                    index,
                    dates.len()
                ))
            })?;
            let table = self.load(date, store)?;
            if self.cache.push(index, table).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        window
            .iter()
            .map(|index| {
                self.cache.peek(index).ok_or_else(|| {
                    ClimatologyError::configuration(format!(
                        "window of {} dates exceeds cache capacity {}",
                        window.len(),
                        self.cache.cap()
                    ))
                })
            })
            .collect()
    }

    fn load<S>(&self, date: SpcDate, store: &S) -> Result<StormTable>
    where
        S: TrackStore + ?Sized,
    {
        let files = store
            .list_files(date, &self.source, self.tracking_scale_m2)
            .map_err(|e| ClimatologyError::store(date, e.to_string()))?;

        if files.is_empty() {
            warn!(date = %date, "No tracking files found; using an empty table");
            return Ok(StormTable::empty());
        }

        let table = store
            .read_tables(&files)
            .map_err(|e| ClimatologyError::store(date, e.to_string()))?;
        self.loads.fetch_add(1, Ordering::Relaxed);

        debug!(date = %date, files = files.len(), rows = table.len(), "Loaded tracking data");
        Ok(table)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.cache.len(),
        }
    }

    pub fn contains(&self, index: DateIndex) -> bool {
        self.cache.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryTrackStore;
    use crate::window::{resolve, ClimatologyMode};
    use storm_common::StormObject;

    fn setup(num_dates: usize) -> (DateRange, MemoryTrackStore) {
        let dates = DateRange::parse("20110401", "20110430").unwrap();
        let dates = DateRange::new(dates.as_slice()[0], dates.as_slice()[num_dates - 1]).unwrap();
        let store = MemoryTrackStore::new();
        for (i, date) in dates.iter() {
            store.insert(
                date,
                StormTable::from_rows(vec![StormObject::new(format!("s{}", i), i as i64, 1000)]),
            );
        }
        (dates, store)
    }

    #[test]
    fn test_window_tables_in_index_order() {
        let (dates, store) = setup(3);
        let mut cache = TrackTableCache::new("segmotion", 1);
        let window = resolve(1, 3, ClimatologyMode::Birth);

        let tables = cache.get_window_tables(&window, &dates, &store).unwrap();
        let ids: Vec<&str> = tables.iter().map(|t| t.rows()[0].storm_id.as_str()).collect();
        assert_eq!(ids, vec!["s0", "s1"]);
    }

    #[test]
    fn test_sliding_window_loads_each_date_once() {
        let (dates, store) = setup(5);
        let mut cache = TrackTableCache::new("segmotion", 1);

        for w in 0..5 {
            let window = resolve(w, 5, ClimatologyMode::Death);
            let cleared = cache.evict(&window, &dates);
            if w > 0 {
                assert_eq!(cleared, vec![dates.get(w - 1).unwrap()]);
            }
            cache.get_window_tables(&window, &dates, &store).unwrap();
            assert!(cache.len() <= MAX_WINDOW_SIZE);
        }

        assert_eq!(store.read_count(), 5);
        let stats = cache.stats();
        assert_eq!(stats.loads, 5);
        assert_eq!(stats.misses, 5);
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.evictions, 4);
    }

    #[test]
    fn test_passage_window_holds_one_date() {
        let (dates, store) = setup(3);
        let mut cache = TrackTableCache::new("segmotion", 1);
        for w in 0..3 {
            let window = resolve(w, 3, ClimatologyMode::Passage);
            cache.evict(&window, &dates);
            cache.get_window_tables(&window, &dates, &store).unwrap();
            assert_eq!(cache.len(), 1);
            assert!(cache.contains(w));
        }
    }

    #[test]
    fn test_missing_date_is_empty_table() {
        let dates = DateRange::parse("20110401", "20110402").unwrap();
        let store = MemoryTrackStore::new();
        let mut cache = TrackTableCache::new("segmotion", 1);
        let window = resolve(1, 2, ClimatologyMode::Birth);

        let tables = cache.get_window_tables(&window, &dates, &store).unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|t| t.is_empty()));
        assert_eq!(cache.stats().loads, 0);
    }

    #[test]
    fn test_out_of_range_index() {
        let (dates, store) = setup(2);
        let mut cache = TrackTableCache::new("segmotion", 1);
        let window: BTreeSet<usize> = [5].into_iter().collect();
        assert!(cache.get_window_tables(&window, &dates, &store).is_err());
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::default();
        assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);
        stats.hits = 3;
        stats.misses = 1;
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
