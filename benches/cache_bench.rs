use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipseek::{DatabaseBuilder, Seeker};
use std::hint::black_box;
use std::io::Write;
use std::net::Ipv4Addr;
use std::time::Duration;
use tempfile::NamedTempFile;

/// 10,000 /24 ranges starting at 1.0.0.0
fn build_database() -> Vec<u8> {
    let mut builder = DatabaseBuilder::new();
    for i in 0..10_000u32 {
        let begin = 0x0100_0000 + (i << 8);
        builder
            .add_range(
                Ipv4Addr::from(begin),
                Ipv4Addr::from(begin + 0xff),
                &format!("省份{}", i % 31),
                &format!("运营商{}", i % 7),
            )
            .unwrap();
    }
    builder.build().unwrap()
}

/// Benchmark cache overhead at different hit rates
fn bench_cache_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_comparison");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(50);

    let db_bytes = build_database();
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&db_bytes).unwrap();
    file.flush().unwrap();

    for hit_rate in [0, 50, 80, 95, 99] {
        let total_queries = 10_000usize;
        let unique_queries = if hit_rate == 0 {
            total_queries
        } else {
            (total_queries * (100 - hit_rate)) / 100
        };

        let queries: Vec<String> = (0..total_queries)
            .map(|i| {
                let idx = (i % unique_queries.max(1)) as u32;
                Ipv4Addr::from(0x0100_0000 + idx * 97).to_string()
            })
            .collect();

        let cached = Seeker::from(file.path()).open().unwrap();
        group.throughput(Throughput::Elements(total_queries as u64));
        group.bench_with_input(
            BenchmarkId::new("with_cache", format!("{}%_hits", hit_rate)),
            &queries,
            |b, queries| {
                b.iter(|| {
                    cached.clear_cache();
                    for query in queries {
                        black_box(cached.location(query));
                    }
                });
            },
        );

        let uncached = Seeker::from(file.path()).no_cache().open().unwrap();
        group.bench_with_input(
            BenchmarkId::new("no_cache", format!("{}%_hits", hit_rate)),
            &queries,
            |b, queries| {
                b.iter(|| {
                    for query in queries {
                        black_box(uncached.location(query));
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cache_comparison);
criterion_main!(benches);
