//! Perfect Cuckoo Filter Benchmarks
//!
//! Criterion benchmarks for insert, lookup, delete and UTXO record parsing.
//!
//! To run the benchmarks:
//! ```bash
//! cargo bench --features benchmarking
//! ```

use criterion::{
    black_box, criterion_group, criterion_main, measurement::WallTime, BatchSize, BenchmarkId,
    Criterion, SamplingMode, Throughput,
};
use std::time::Duration;

use perfect_cuckoo_lib::data_structures::perfect_cuckoo_filter::{
    CuckooFilterConfig, PerfectCuckooFilter,
};
use perfect_cuckoo_lib::utxo::{parse_record, UtxoValue};

const NUM_BUCKETS: usize = 1 << 16;

fn keys(count: usize, salt: u64) -> Vec<String> {
    (0..count as u64)
        .map(|i| format!("{:016x}:{}", i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ salt, i % 1000))
        .collect()
}

fn filled(count: usize) -> (PerfectCuckooFilter<UtxoValue>, Vec<String>) {
    let config = CuckooFilterConfig::new()
        .with_num_buckets(NUM_BUCKETS)
        .with_seed(42);
    let mut filter = PerfectCuckooFilter::with_config(config).unwrap();
    let keys = keys(count, 0);
    for (i, key) in keys.iter().enumerate() {
        let _ = filter.insert(key, UtxoValue::new(false, i as u64, 1_000, "", ""));
    }
    (filter, keys)
}

/// Benchmark inserts at increasing fill levels
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcf_insert");
    group.sampling_mode(SamplingMode::Flat);
    group.measurement_time(Duration::from_secs(2));
    group.warm_up_time(Duration::from_secs(1));

    // 25%, 50% and 85% of the 2^18 slots
    for count in [65_536usize, 131_072, 222_822] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("fill", count), &count, |b, &count| {
            let keys = keys(count, 0);
            b.iter_batched(
                || {
                    PerfectCuckooFilter::<UtxoValue>::with_config(
                        CuckooFilterConfig::new()
                            .with_num_buckets(NUM_BUCKETS)
                            .with_seed(42),
                    )
                    .unwrap()
                },
                |mut filter| {
                    for key in &keys {
                        let _ = filter.insert(black_box(key), UtxoValue::default());
                    }
                    filter
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Benchmark present and absent lookups
fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcf_lookup");
    group.measurement_time(Duration::from_secs(2));

    for count in [65_536usize, 222_822] {
        let (filter, present) = filled(count);
        let absent = keys(10_000, 0xDEAD_BEEF);

        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(BenchmarkId::new("present", count), &present, |b, keys| {
            b.iter(|| {
                keys.iter()
                    .take(10_000)
                    .filter(|key| filter.contains(black_box(key.as_str())))
                    .count()
            });
        });
        group.bench_with_input(BenchmarkId::new("absent", count), &absent, |b, keys| {
            b.iter(|| {
                keys.iter()
                    .filter(|key| filter.contains(black_box(key.as_str())))
                    .count()
            });
        });
    }

    group.finish();
}

/// Benchmark deletes from a half-full table
fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("pcf_delete");
    group.measurement_time(Duration::from_secs(2));

    let count = 131_072;
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("delete_10k", |b| {
        b.iter_batched(
            || filled(count),
            |(mut filter, keys)| {
                for key in keys.iter().take(10_000) {
                    black_box(filter.delete(key));
                }
                filter
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

/// Benchmark dataset line parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("utxo_parse");

    let lines = [
        ("comma", "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16:0,1,170,5000000000,76a914ab,1Q2TWHE3GMdB6BZKafqwxXtWAWgFt5Jvm3"),
        ("tab", "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16:1\t0\t170\t1000000000\t76a914cd\t12cbQLTFMXRnSzktFkuoG3eHoMeFtpTu3S"),
        ("space", "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16:2 0 170 4000000000 76a914ef 1Q2TWHE3GMdB6BZKafqwxXtWAWgFt5Jvm3"),
    ];
    for (name, line) in lines {
        group.bench_with_input(BenchmarkId::new("parse_record", name), line, |b, line| {
            b.iter(|| parse_record(black_box(line)))
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_measurement(WallTime)
        .significance_level(0.01)
        .noise_threshold(0.02)
        .confidence_level(0.99);
    targets = bench_insert, bench_lookup, bench_delete, bench_parse
}

criterion_main!(benches);
