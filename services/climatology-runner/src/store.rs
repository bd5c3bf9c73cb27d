//! Filesystem-backed track store.
//!
//! Layout: `{root}/{source}/scale_{scale}m2/{YYYY}/{YYYYMMDD}/*.json`, each
//! file holding one storm object table:
//!
//! ```json
//! {"columns": ["storm_id", "unix_time_sec", "age_sec", ...],
//!  "rows": [{"storm_id": "0001_20110427", "unix_time_sec": 1303862400, ...}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use climatology::{date_directory, TrackStore, TrackStoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storm_common::{SpcDate, StormObject, StormTable};
use tracing::debug;

/// Extension of tracking files inside a date directory.
pub const TRACK_FILE_EXTENSION: &str = "json";

/// On-disk shape of a tracking file.
#[derive(Debug, Serialize, Deserialize)]
struct TrackFile {
    #[serde(default)]
    columns: Vec<String>,
    rows: Vec<Value>,
}

/// Track store reading JSON tracking files from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryTrackStore {
    root: PathBuf,
}

impl DirectoryTrackStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory holding one date's files.
    pub fn date_dir(&self, date: SpcDate, source: &str, tracking_scale_m2: u64) -> PathBuf {
        self.root.join(date_directory(source, tracking_scale_m2, date))
    }

    /// Write a table as a tracking file for `date`, creating directories as
    /// needed. Returns the file path.
    pub fn write_table(
        &self,
        date: SpcDate,
        source: &str,
        tracking_scale_m2: u64,
        file_name: &str,
        table: &StormTable,
    ) -> Result<PathBuf, TrackStoreError> {
        let dir = self.date_dir(date, source, tracking_scale_m2);
        fs::create_dir_all(&dir).map_err(|e| TrackStoreError::io(&dir, e))?;

        let path = dir.join(file_name);
        let rows = table
            .rows()
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| TrackStoreError::malformed(&path, e.to_string()))?;
        let file = TrackFile {
            columns: table.columns().to_vec(),
            rows,
        };
        let body = serde_json::to_vec_pretty(&file)
            .map_err(|e| TrackStoreError::malformed(&path, e.to_string()))?;
        fs::write(&path, body).map_err(|e| TrackStoreError::io(&path, e))?;
        Ok(path)
    }
}

impl TrackStore for DirectoryTrackStore {
    fn list_files(
        &self,
        date: SpcDate,
        source: &str,
        tracking_scale_m2: u64,
    ) -> Result<Vec<PathBuf>, TrackStoreError> {
        let dir = self.date_dir(date, source, tracking_scale_m2);
        if !dir.exists() {
            debug!(date = %date, dir = %dir.display(), "No tracking directory");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| TrackStoreError::io(&dir, e.into()))?;
            let is_track_file = entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some(TRACK_FILE_EXTENSION);
            if is_track_file {
                files.push(entry.into_path());
            }
        }
        files.sort();

        debug!(date = %date, files = files.len(), "Listed tracking files");
        Ok(files)
    }

    fn read_table(&self, path: &Path) -> Result<StormTable, TrackStoreError> {
        if !path.exists() {
            return Err(TrackStoreError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| TrackStoreError::io(path, e))?;
        let file: TrackFile = serde_json::from_str(&content)
            .map_err(|e| TrackStoreError::malformed(path, e.to_string()))?;

        let rows = file
            .rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                StormObject::from_json(row)
                    .map_err(|e| TrackStoreError::malformed(path, format!("row {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(if file.columns.is_empty() {
            StormTable::from_rows(rows)
        } else {
            StormTable::with_columns(file.columns, rows)
        })
    }
}
