//! End-to-end runs against tracking files on disk.

use std::fs;
use std::path::Path;

use test_utils::{store_from_tracks, synthetic_season};
use climatology::{ClimatologyMode, ClimatologyRunner, MemoryTrackStore, TrackStore};
use climatology_runner::{load_runner_config, ClimatologyReport, DirectoryTrackStore};
use storm_common::{DateRange, StormObject, StormTable};

const SOURCE: &str = "segmotion";
const SCALE: u64 = 314_159_265;

/// Copy every date of an in-memory store to a directory store.
fn write_to_disk(memory: &MemoryTrackStore, dates: &DateRange, root: &Path) -> DirectoryTrackStore {
    let disk = DirectoryTrackStore::new(root);
    for (_, date) in dates.iter() {
        let files = memory.list_files(date, SOURCE, SCALE).unwrap();
        for (i, file) in files.iter().enumerate() {
            let table = memory.read_table(file).unwrap();
            let name = format!("storm-tracking_{:03}.json", i);
            disk.write_table(date, SOURCE, SCALE, &name, &table).unwrap();
        }
    }
    disk
}

fn write_run_file(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("run.yaml");
    fs::write(&path, body).unwrap();
    path
}

// ============================================================================
// Directory store
// ============================================================================

#[test]
fn test_directory_store_matches_memory_store() {
    let tmp = tempfile::tempdir().unwrap();
    let dates = DateRange::parse("20110401", "20110406").unwrap();
    let memory = store_from_tracks(&dates, &synthetic_season(&dates, 6));
    let disk = write_to_disk(&memory, &dates, tmp.path());

    for mode in [
        ClimatologyMode::Birth,
        ClimatologyMode::Death,
        ClimatologyMode::Passage,
    ] {
        let config = climatology::ClimatologyConfig {
            first_date: dates.first(),
            last_date: dates.last(),
            mode,
            ..Default::default()
        };
        let runner = ClimatologyRunner::new(config).unwrap();
        let from_memory = runner.run(&memory).unwrap();
        let from_disk = runner.run(&disk).unwrap();
        assert_eq!(from_memory.events, from_disk.events);
        assert_eq!(from_memory.hour_histogram, from_disk.hour_histogram);
    }
}

#[test]
fn test_files_listed_in_name_order() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DirectoryTrackStore::new(tmp.path());
    let date = storm_common::SpcDate::parse("20110427").unwrap();

    let late = StormTable::from_rows(vec![StormObject::new("b", 2000, 900)]);
    let early = StormTable::from_rows(vec![StormObject::new("a", 1000, 900)]);
    store.write_table(date, SOURCE, SCALE, "tracks_0200.json", &late).unwrap();
    store.write_table(date, SOURCE, SCALE, "tracks_0100.json", &early).unwrap();
    // Ignored: wrong extension
    fs::write(store.date_dir(date, SOURCE, SCALE).join("notes.txt"), "x").unwrap();

    let files = store.list_files(date, SOURCE, SCALE).unwrap();
    assert_eq!(files.len(), 2);
    let table = store.read_tables(&files).unwrap();
    let ids: Vec<_> = table.rows().iter().map(|r| r.storm_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_malformed_file_aborts_run() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DirectoryTrackStore::new(tmp.path());
    let date = storm_common::SpcDate::parse("20110427").unwrap();
    let dir = store.date_dir(date, SOURCE, SCALE);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("broken.json"), "{\"rows\": [").unwrap();

    let config = climatology::ClimatologyConfig {
        first_date: Some(date),
        last_date: Some(date),
        ..Default::default()
    };
    let err = ClimatologyRunner::new(config).unwrap().run(&store).unwrap_err();
    assert!(err.to_string().contains("20110427"));
}

// ============================================================================
// Run file
// ============================================================================

#[test]
fn test_run_from_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dates = DateRange::parse("20110401", "20110403").unwrap();
    let memory = store_from_tracks(&dates, &synthetic_season(&dates, 5));
    let data_dir = tmp.path().join("tracking");
    let disk = write_to_disk(&memory, &dates, &data_dir);

    std::env::set_var("CLIM_RUNNER_TEST_DATA", data_dir.to_str().unwrap());
    let path = write_run_file(
        tmp.path(),
        r#"
data_dir: ${CLIM_RUNNER_TEST_DATA}
partitions: 2
climatology:
  first_date: "20110401"
  last_date: "20110403"
  mode: death
  grid:
    type: lat_lng
    min_latitude_deg: 20.0
    min_longitude_deg: 230.0
    latitude_spacing_deg: 1.0
    longitude_spacing_deg: 1.0
    num_rows: 36
    num_columns: 71
"#,
    );

    let config = load_runner_config(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config.data_dir, data_dir);

    let runner = ClimatologyRunner::new(config.climatology.clone()).unwrap();
    let store = DirectoryTrackStore::new(&config.data_dir);
    let partitioned = runner.run_partitioned(&store, config.partitions).unwrap();
    let sequential = runner.run(&disk).unwrap();
    assert_eq!(partitioned.events, sequential.events);
    assert_eq!(partitioned.spatial_counts, sequential.spatial_counts);

    let report = ClimatologyReport::build(&partitioned, runner.dates(), runner.grid());
    assert_eq!(report.dates_processed, 3);
    assert_eq!(report.hour_histogram.iter().sum::<u64>(), report.events);
    let grid = report.grid.unwrap();
    assert_eq!(grid.binned + grid.no_location + grid.outside_grid, report.events);
}

#[test]
fn test_missing_config_file_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_runner_config(tmp.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read run config"));
}
