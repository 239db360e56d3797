//! Log append and read benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use seglog_bench::{filled_log, random_data};
use seglog_core::{Config, Log};
use tempfile::TempDir;

/// Benchmark appends to an in-memory log.
fn bench_inmemory_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_append");

    for size in [64, 256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let log = Log::open_in_memory(Config::default()).unwrap();
            let data = random_data(size);

            b.iter(|| {
                let offset = log.append(black_box(&data)).unwrap();
                black_box(offset);
            });
        });
    }

    group.finish();
}

/// Benchmark appends to a file-backed log, with and without per-append sync.
fn bench_file_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_append");

    // Synced appends are slow; keep the run short
    group.sample_size(20);

    for sync in [false, true] {
        let label = if sync { "synced" } else { "buffered" };
        group.throughput(Throughput::Bytes(256));
        group.bench_function(BenchmarkId::new(label, 256), |b| {
            let temp_dir = TempDir::new().unwrap();
            let config = Config::default().sync_on_append(sync);
            let log = Log::open_with_config(temp_dir.path(), config).unwrap();
            let data = random_data(256);

            b.iter(|| {
                let offset = log.append(black_box(&data)).unwrap();
                black_box(offset);
            });
        });
    }

    group.finish();
}

/// Benchmark random-offset reads from a file-backed log.
fn bench_file_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_read");

    for count in [1_000usize, 10_000].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let temp_dir = TempDir::new().unwrap();
            let log = filled_log(temp_dir.path(), count, 128);
            let mut rng = rand::thread_rng();

            b.iter(|| {
                let offset = rng.gen_range(0..count as u64);
                let record = log.read(black_box(offset)).unwrap();
                black_box(record);
            });
        });
    }

    group.finish();
}

/// Benchmark reads routed across many rotated segments.
fn bench_segment_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_routing");

    for max_bytes in [4 * 1024u64, 64 * 1024].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_bytes),
            max_bytes,
            |b, &max_bytes| {
                let config = Config::default().max_segment_bytes(max_bytes);
                let log = Log::open_in_memory(config).unwrap();
                let data = random_data(128);
                for _ in 0..5_000 {
                    log.append(&data).unwrap();
                }
                let mut rng = rand::thread_rng();

                b.iter(|| {
                    let offset = rng.gen_range(0..5_000u64);
                    black_box(log.read(black_box(offset)).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_inmemory_append,
    bench_file_append,
    bench_file_read,
    bench_segment_routing,
);

criterion_main!(benches);
