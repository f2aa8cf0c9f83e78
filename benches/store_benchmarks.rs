//! Turn-record store benchmarks
//!
//! Benchmarks for the read-merge-rewrite append path:
//! - Append cost as the current file grows
//! - Reading a turn log back
//!
//! Toyota Way: Measure before optimizing (Genchi Genbutsu)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use por_engine::store::{read_records, RecordStore, TurnRecord};

fn turn(id: i64) -> TurnRecord {
    TurnRecord::builder(id, format!("prompt {id}"), format!("response {id}"))
        .q_self(0.7)
        .s_q(0.4)
        .t_total(120)
        .build()
}

/// Create a turn log holding `num_records` records
fn create_turn_log(store: &RecordStore, path: &std::path::Path, num_records: i64) {
    let _ = std::fs::remove_file(path);
    for id in 0..num_records {
        store.append(&turn(id), path).unwrap();
    }
}

/// Benchmark one append onto an existing file
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");
    let store = RecordStore::with_max_bytes(u64::MAX);
    let dir = tempfile::tempdir().unwrap();

    for size in [10_i64, 100, 500].iter() {
        let path = dir.path().join(format!("turns_bench_{size}.parquet"));
        create_turn_log(&store, &path, *size);
        let base = std::fs::read(&path).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &n| {
            b.iter(|| {
                std::fs::write(&path, &base).unwrap();
                black_box(store.append(&turn(n), &path).unwrap())
            });
        });
    }

    group.finish();
}

/// Benchmark reading a turn log
fn bench_read_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_records");
    let store = RecordStore::with_max_bytes(u64::MAX);
    let dir = tempfile::tempdir().unwrap();

    for size in [10_i64, 100, 500].iter() {
        let path = dir.path().join(format!("turns_read_{size}.parquet"));
        create_turn_log(&store, &path, *size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &path, |b, path| {
            b.iter(|| black_box(read_records(path).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append, bench_read_records);
criterion_main!(benches);
