//! Workload generation benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use s3_parallel_put::bench::{metadata, payload};

fn benchmark_payload_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload_sizes");

    for size in [1024, 1024 * 1024, 10 * 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(format!("{}_bytes", size), size, |b, &size| {
            b.iter(|| black_box(payload(size)));
        });
    }

    group.finish();
}

fn benchmark_metadata(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata");

    for count in [1, 8, 32].iter() {
        group.bench_with_input(format!("{}_entries_1k", count), count, |b, &count| {
            b.iter(|| black_box(metadata(count, 1024)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_payload_sizes, benchmark_metadata);
criterion_main!(benches);
