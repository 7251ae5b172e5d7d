use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use metricdb_core::storage::MetricStore;
use tempfile::TempDir;

fn bench_sequential_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Elements(10_000));

    group.bench_function("sequential_10k", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let store = MetricStore::open(dir.path(), 1_000).unwrap();
                (dir, store)
            },
            |(_dir, store)| {
                for ts in 0..10_000 {
                    store.add(ts, 'a', 1);
                }
            },
            BatchSize::PerIteration,
        )
    });

    group.bench_function("interleaved_keys_10k", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().unwrap();
                let store = MetricStore::open(dir.path(), 1_000).unwrap();
                (dir, store)
            },
            |(_dir, store)| {
                for ts in 0..10_000i64 {
                    let key = (b'a' + (ts % 8) as u8) as char;
                    store.add(ts, key, 1);
                }
            },
            BatchSize::PerIteration,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_sequential_writes);
criterion_main!(benches);
