//! Climatology run driver.
//!
//! ```text
//! for each working date index w:
//!     window  = resolve(w, N, mode)
//!     cache.evict(window); tables = cache.get_window_tables(window)
//!     table   = stitch(tables, min_age)
//!     events  = classify(table, mode)
//!     hours.bin(events); cells.bin(events); stats.collect(table, events)
//! ```

use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use storm_common::{DateIndex, DateRange, SpcDate};
use tracing::{debug, info, instrument};

use crate::binning::{CountMatrix, HourHistogram, SpatialBinStats, SpatialBinner};
use crate::cache::{CacheStats, TrackTableCache};
use crate::classify::{classify, ClassifierOptions};
use crate::config::{BinningGrid, ClimatologyConfig};
use crate::error::{ClimatologyError, Result};
use crate::statistics::StatisticsAccumulator;
use crate::stitch::stitch;
use crate::store::TrackStore;
use crate::window::{resolve, ClimatologyMode};

/// Accumulated output of a run or of one partition of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimatologyResult {
    pub mode: ClimatologyMode,
    pub dates_processed: usize,
    pub events: u64,
    pub hour_histogram: HourHistogram,
    pub spatial_counts: Option<CountMatrix>,
    pub spatial_stats: SpatialBinStats,
    pub statistics: Option<StatisticsAccumulator>,
    pub cache: CacheStats,
}

impl ClimatologyResult {
    fn empty(mode: ClimatologyMode, grid: Option<&BinningGrid>, collect_statistics: bool) -> Self {
        Self {
            mode,
            dates_processed: 0,
            events: 0,
            hour_histogram: HourHistogram::new(),
            spatial_counts: grid.map(|g| CountMatrix::for_grid(&g.spec)),
            spatial_stats: SpatialBinStats::default(),
            statistics: collect_statistics.then(StatisticsAccumulator::new),
            cache: CacheStats::default(),
        }
    }

    /// Add another partial result elementwise.
    pub fn merge(&mut self, other: &ClimatologyResult) -> Result<()> {
        if self.mode != other.mode {
            return Err(ClimatologyError::merge(format!(
                "mode {} vs {}",
                self.mode, other.mode
            )));
        }

        match (&mut self.spatial_counts, &other.spatial_counts) {
            (Some(mine), Some(theirs)) => mine.merge(theirs)?,
            (None, None) => {}
            _ => return Err(ClimatologyError::merge("only one result has a grid")),
        }

        match (&mut self.statistics, &other.statistics) {
            (Some(mine), Some(theirs)) => mine.merge(theirs),
            (None, None) => {}
            _ => return Err(ClimatologyError::merge("only one result has statistics")),
        }

        self.dates_processed += other.dates_processed;
        self.events += other.events;
        self.hour_histogram.merge(&other.hour_histogram);
        self.spatial_stats.merge(&other.spatial_stats);
        self.cache.merge(&other.cache);
        Ok(())
    }
}

/// Runs a climatology over a date range.
pub struct ClimatologyRunner {
    config: ClimatologyConfig,
    dates: DateRange,
    grid: Option<BinningGrid>,
}

impl ClimatologyRunner {
    /// Validate the configuration and build the grid.
    pub fn new(config: ClimatologyConfig) -> Result<Self> {
        config.validate().map_err(ClimatologyError::configuration)?;
        let dates = config.date_range()?;
        let grid = config.grid.as_ref().map(|g| g.build()).transpose()?;
        Ok(Self {
            config,
            dates,
            grid,
        })
    }

    pub fn config(&self) -> &ClimatologyConfig {
        &self.config
    }

    pub fn dates(&self) -> &DateRange {
        &self.dates
    }

    pub fn grid(&self) -> Option<&BinningGrid> {
        self.grid.as_ref()
    }

    fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            trailing_window_seconds: self
                .config
                .trailing_filter_enabled()
                .then_some(self.config.trailing_window_seconds),
            once_per_hour: self.config.passage_once_per_hour,
        }
    }

    /// Process every date in order.
    pub fn run<S>(&self, store: &S) -> Result<ClimatologyResult>
    where
        S: TrackStore + ?Sized,
    {
        info!(
            mode = %self.config.mode,
            first_date = ?self.dates.first().map(|d| d.to_string()),
            last_date = ?self.dates.last().map(|d| d.to_string()),
            dates = self.dates.len(),
            "Starting climatology run"
        );
        let result = self.run_indices(store, 0..self.dates.len())?;
        self.log_summary(&result);
        Ok(result)
    }

    /// Split the dates into contiguous partitions, process them in parallel
    /// and merge the partial results.
    ///
    /// Windows are still resolved against the whole range, so the merged
    /// result equals [`run`](Self::run).
    pub fn run_partitioned<S>(&self, store: &S, partitions: usize) -> Result<ClimatologyResult>
    where
        S: TrackStore + ?Sized,
    {
        let ranges = partition_indices(self.dates.len(), partitions);
        info!(
            mode = %self.config.mode,
            dates = self.dates.len(),
            partitions = ranges.len(),
            "Starting partitioned climatology run"
        );

        let partials = ranges
            .into_par_iter()
            .map(|range| self.run_indices(store, range))
            .collect::<Result<Vec<_>>>()?;

        let mut result =
            ClimatologyResult::empty(self.config.mode, self.grid.as_ref(), self.config.collect_statistics);
        for partial in &partials {
            result.merge(partial)?;
        }
        self.log_summary(&result);
        Ok(result)
    }

    fn run_indices<S>(&self, store: &S, indices: Range<DateIndex>) -> Result<ClimatologyResult>
    where
        S: TrackStore + ?Sized,
    {
        let mut cache = TrackTableCache::new(self.config.source.clone(), self.config.tracking_scale_m2);
        let mut spatial = self.grid.clone().map(SpatialBinner::new);
        let mut result =
            ClimatologyResult::empty(self.config.mode, self.grid.as_ref(), self.config.collect_statistics);

        for index in indices {
            let Some(date) = self.dates.get(index) else {
                break;
            };
            self.process_date(index, date, store, &mut cache, spatial.as_mut(), &mut result)?;
        }

        result.spatial_counts = spatial.map(SpatialBinner::into_counts);
        result.cache = cache.stats();
        Ok(result)
    }

    #[instrument(skip_all, fields(date = %date, index = index))]
    fn process_date<S>(
        &self,
        index: DateIndex,
        date: SpcDate,
        store: &S,
        cache: &mut TrackTableCache,
        spatial: Option<&mut SpatialBinner>,
        result: &mut ClimatologyResult,
    ) -> Result<()>
    where
        S: TrackStore + ?Sized,
    {
        let mode = self.config.mode;
        let window = resolve(index, self.dates.len(), mode);
        cache.evict(&window, &self.dates);

        let tables = cache.get_window_tables(&window, &self.dates, store)?;
        let table = stitch(&tables, self.config.min_age_seconds);
        let events = classify(&table, mode, self.classifier_options());

        result.hour_histogram.bin(&events);
        result.events += events.len() as u64;
        result.dates_processed += 1;

        if let Some(binner) = spatial {
            let stats = binner.bin(&events);
            result.spatial_stats.merge(&stats);
            debug!(
                binned = stats.binned,
                no_location = stats.no_location,
                outside_grid = stats.outside_grid,
                running_binned = result.spatial_stats.binned,
                nonzero_cells = binner.counts().nonzero_cells(),
                "Spatial binning"
            );
        }

        if let Some(statistics) = result.statistics.as_mut() {
            statistics.collect(&table, &events, mode);
        }

        info!(
            window = ?window,
            rows = table.len(),
            events = events.len(),
            running_hour_counts = ?result.hour_histogram.counts(),
            "Processed SPC date"
        );
        Ok(())
    }

    fn log_summary(&self, result: &ClimatologyResult) {
        info!(
            mode = %result.mode,
            dates = result.dates_processed,
            events = result.events,
            binned = result.spatial_stats.binned,
            no_location = result.spatial_stats.no_location,
            outside_grid = result.spatial_stats.outside_grid,
            cache_loads = result.cache.loads,
            cache_hit_rate = result.cache.hit_rate(),
            "Climatology run complete"
        );
    }
}

/// Split `0..total` into at most `partitions` contiguous, non-empty ranges.
pub fn partition_indices(total: usize, partitions: usize) -> Vec<Range<DateIndex>> {
    if total == 0 {
        return Vec::new();
    }
    let partitions = partitions.clamp(1, total);
    let chunk = total.div_ceil(partitions);
    (0..total)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(total))
        .collect()
}
