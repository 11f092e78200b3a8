use criterion::{criterion_group, criterion_main, Criterion};
use lsm_kv::BloomFilter;

fn bloom_construction(c: &mut Criterion) {
    c.bench_function("bloom filter insert key", |b| {
        let mut filter = BloomFilter::with_fp_rate(1_000_000, 0.01);
        let mut key = 0;

        b.iter(|| {
            filter.insert(key);
            key = key.wrapping_add(1);
        });
    });
}

fn bloom_contains(c: &mut Criterion) {
    let n = 100_000;
    let mut filter = BloomFilter::with_fp_rate(n, 0.01);

    for key in 0..n as i32 {
        filter.insert(key);
    }

    c.bench_function("bloom filter possibly_contains, true positive", |b| {
        let mut key = 0;

        b.iter(|| {
            assert!(filter.possibly_contains(key % n as i32));
            key += 1;
        });
    });
}

criterion_group!(benches, bloom_construction, bloom_contains);
criterion_main!(benches);
