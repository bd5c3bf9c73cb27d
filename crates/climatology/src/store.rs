//! Track-file storage abstraction.
//!
//! The pipeline never touches the filesystem directly: it asks a
//! [`TrackStore`] which files exist for an SPC date and then reads them
//! into a [`StormTable`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use storm_common::{SpcDate, StormTable};
use thiserror::Error;

use crate::stitch::concat_tables;

/// Errors raised by a track store.
#[derive(Error, Debug)]
pub enum TrackStoreError {
    /// Listing or reading a file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was readable but not a valid storm table.
    #[error("malformed track file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// The path is not known to the store.
    #[error("track file not found: {0}")]
    NotFound(PathBuf),
}

impl TrackStoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Source of per-date storm-track tables.
pub trait TrackStore: Send + Sync {
    /// List the tracking files for one SPC date, sorted.
    ///
    /// An empty list means the date has no data; it is not an error.
    fn list_files(
        &self,
        date: SpcDate,
        source: &str,
        tracking_scale_m2: u64,
    ) -> Result<Vec<PathBuf>, TrackStoreError>;

    /// Read one tracking file.
    fn read_table(&self, path: &Path) -> Result<StormTable, TrackStoreError>;

    /// Read and concatenate tracking files in order, aligning their columns.
    fn read_tables(&self, paths: &[PathBuf]) -> Result<StormTable, TrackStoreError> {
        let tables = paths
            .iter()
            .map(|path| self.read_table(path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(concat_tables(&tables))
    }
}

/// Directory of one date's tracking files, relative to the store root:
/// `{source}/scale_{scale}m2/{YYYY}/{YYYYMMDD}`.
pub fn date_directory(source: &str, tracking_scale_m2: u64, date: SpcDate) -> PathBuf {
    PathBuf::from(source)
        .join(format!("scale_{}m2", tracking_scale_m2))
        .join(date.storage_path())
}

/// In-memory track store for tests and benchmarks.
#[derive(Debug, Default)]
pub struct MemoryTrackStore {
    files: RwLock<HashMap<PathBuf, StormTable>>,
    by_date: RwLock<HashMap<SpcDate, Vec<PathBuf>>>,
    reads: AtomicU64,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table as one more tracking file for `date`.
    pub fn insert(&self, date: SpcDate, table: StormTable) {
        let mut by_date = self.by_date.write().unwrap_or_else(|e| e.into_inner());
        let paths = by_date.entry(date).or_default();
        let path = PathBuf::from(date.storage_path())
            .join(format!("storm-tracking_{:03}.json", paths.len()));
        paths.push(path.clone());

        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path, table);
    }

    /// Number of `read_table` calls served.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl TrackStore for MemoryTrackStore {
    fn list_files(
        &self,
        date: SpcDate,
        _source: &str,
        _tracking_scale_m2: u64,
    ) -> Result<Vec<PathBuf>, TrackStoreError> {
        let by_date = self.by_date.read().unwrap_or_else(|e| e.into_inner());
        Ok(by_date.get(&date).cloned().unwrap_or_default())
    }

    fn read_table(&self, path: &Path) -> Result<StormTable, TrackStoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(path)
            .cloned()
            .ok_or_else(|| TrackStoreError::NotFound(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storm_common::StormObject;

    #[test]
    fn test_date_directory() {
        let date = SpcDate::parse("20110427").unwrap();
        assert_eq!(
            date_directory("segmotion", 314_159_265, date),
            PathBuf::from("segmotion/scale_314159265m2/2011/20110427")
        );
    }

    #[test]
    fn test_memory_store_lists_in_insertion_order() {
        let store = MemoryTrackStore::new();
        let date = SpcDate::parse("20110427").unwrap();
        store.insert(date, StormTable::from_rows(vec![StormObject::new("a", 0, 900)]));
        store.insert(date, StormTable::from_rows(vec![StormObject::new("b", 60, 900)]));

        let files = store.list_files(date, "segmotion", 1).unwrap();
        assert_eq!(files.len(), 2);

        let table = store.read_tables(&files).unwrap();
        let ids: Vec<_> = table.rows().iter().map(|r| r.storm_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.read_count(), 2);
    }

    #[test]
    fn test_memory_store_missing_date_is_empty() {
        let store = MemoryTrackStore::new();
        let date = SpcDate::parse("20110427").unwrap();
        assert!(store.list_files(date, "segmotion", 1).unwrap().is_empty());
        assert!(store.read_table(Path::new("nope.json")).is_err());
    }
}
