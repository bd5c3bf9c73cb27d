//! Benchmarks for spatial and temporal binning.
//!
//! Run with: cargo bench --package climatology
//! Or: cargo bench --package climatology --bench spatial_binning

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use test_utils::{store_from_tracks, synthetic_season};
use climatology::{
    assign_by_containment, assign_nearest, classify, BinningGrid, ClassifierOptions,
    ClimatologyConfig, ClimatologyEvent, ClimatologyMode, ClimatologyRunner, HourHistogram,
    SpatialBinner,
};
use storm_common::grid::grids;
use storm_common::{DateRange, StormTable};

fn season_events(storms_per_day: usize) -> Vec<ClimatologyEvent> {
    let dates = DateRange::parse("20110401", "20110407").unwrap();
    let rows = synthetic_season(&dates, storms_per_day).into_iter().flatten().collect();
    classify(
        &StormTable::from_rows(rows),
        ClimatologyMode::Passage,
        ClassifierOptions::default(),
    )
}

// =============================================================================
// CELL ASSIGNMENT BENCHMARKS
// =============================================================================

fn bench_cell_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_assignment");
    let grid = grids::conus_0p1();
    let rows = grid.row_coords();
    let cols = grid.column_coords();

    let points: Vec<(f64, f64)> = (0..100)
        .map(|i| (20.0 + (i * 37 % 350) as f64 * 0.1 + 0.03, 230.0 + (i * 53 % 700) as f64 * 0.1 + 0.02))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));

    group.bench_function("nearest_grid_line", |b| {
        b.iter(|| {
            for &(lat, lng) in &points {
                black_box(assign_nearest(&rows, &cols, 0.1, 0.1, black_box(lat), black_box(lng)));
            }
        })
    });

    // Full scan of all 246k cells per point
    group.sample_size(10);
    group.bench_function("containment_scan", |b| {
        b.iter(|| {
            for &(lat, lng) in points.iter().take(5) {
                black_box(assign_by_containment(&grid, black_box(lat), black_box(lng)));
            }
        })
    });

    group.finish();
}

// =============================================================================
// BINNER BENCHMARKS
// =============================================================================

fn bench_binners(c: &mut Criterion) {
    let mut group = c.benchmark_group("binners");

    for storms_per_day in [10, 100] {
        let events = season_events(storms_per_day);
        group.throughput(Throughput::Elements(events.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("spatial_conus_0p1", storms_per_day),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut binner = SpatialBinner::new(BinningGrid::latlng(grids::conus_0p1()));
                    black_box(binner.bin(events))
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("hour_histogram", storms_per_day),
            &events,
            |b, events| {
                b.iter(|| {
                    let mut hist = HourHistogram::new();
                    black_box(hist.bin(events))
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// FULL RUN BENCHMARKS
// =============================================================================

fn bench_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("runs");
    group.sample_size(10);

    let dates = DateRange::parse("20110401", "20110430").unwrap();
    let store = store_from_tracks(&dates, &synthetic_season(&dates, 50));
    let config = ClimatologyConfig {
        first_date: dates.first(),
        last_date: dates.last(),
        mode: ClimatologyMode::Birth,
        ..Default::default()
    };
    let runner = ClimatologyRunner::new(config).unwrap();

    group.bench_function("sequential_30_days", |b| {
        b.iter(|| black_box(runner.run(&store)))
    });
    group.bench_function("partitioned_4_30_days", |b| {
        b.iter(|| black_box(runner.run_partitioned(&store, 4)))
    });

    group.finish();
}

criterion_group!(benches, bench_cell_assignment, bench_binners, bench_runs);
criterion_main!(benches);
