use authz_proto::{contains, dedupe_sort, difference, union, UserId};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn users(n: usize, stride: u64) -> Vec<UserId> {
    (0..n as u64)
        .map(|i| {
            let mut bytes = [0u8; 16];
            bytes[8..].copy_from_slice(&(i * stride).to_be_bytes());
            UserId::from_bytes(bytes)
        })
        .collect()
}

fn acl_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("acl");

    for size in [16usize, 256, 4096] {
        let orig = dedupe_sort(users(size, 2));
        let other = users(size / 2, 3);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("union", size), &size, |b, _| {
            b.iter(|| union(black_box(&orig), black_box(&other)).unwrap())
        });

        group.bench_with_input(BenchmarkId::new("difference", size), &size, |b, _| {
            b.iter(|| difference(black_box(&orig), black_box(&other)))
        });

        let needle = other[other.len() / 2];
        group.bench_with_input(BenchmarkId::new("contains", size), &size, |b, _| {
            b.iter(|| contains(black_box(&orig), black_box(&needle)))
        });
    }

    group.finish();
}

criterion_group!(benches, acl_benchmark);
criterion_main!(benches);
