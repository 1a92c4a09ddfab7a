use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ipseek::{AccessMode, DatabaseBuilder, Seeker};
use rand::Rng;
use std::hint::black_box;
use std::io::Write;
use std::net::Ipv4Addr;
use tempfile::NamedTempFile;

fn build_database(ranges: u32) -> Vec<u8> {
    let mut builder = DatabaseBuilder::new();
    let span = u32::MAX / ranges;
    for i in 0..ranges {
        let begin = i * span;
        builder
            .add_range(
                Ipv4Addr::from(begin),
                Ipv4Addr::from(begin + span / 2),
                &format!("国家{}", i % 200),
                &format!("地区{}", i % 50),
            )
            .unwrap();
    }
    builder.build().unwrap()
}

fn random_ips(count: usize) -> Vec<Ipv4Addr> {
    let mut rng = rand::rng();
    (0..count).map(|_| Ipv4Addr::from(rng.random::<u32>())).collect()
}

/// Uncached lookups per access mode
fn bench_access_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_mode");
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&build_database(100_000)).unwrap();
    file.flush().unwrap();
    let ips = random_ips(1_000);

    for mode in [AccessMode::Mmap, AccessMode::File, AccessMode::Memory] {
        let seeker = Seeker::from(file.path())
            .access_mode(mode)
            .no_cache()
            .open()
            .unwrap();
        group.throughput(Throughput::Elements(ips.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(mode), &ips, |b, ips| {
            b.iter(|| {
                for &ip in ips {
                    black_box(seeker.lookup(ip));
                }
            });
        });
    }

    group.finish();
}

/// Index search alone, by table size
fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate");
    let ips = random_ips(1_000);

    for ranges in [1_000u32, 100_000, 500_000] {
        let seeker = Seeker::from_bytes(build_database(ranges)).unwrap();
        group.throughput(Throughput::Elements(ips.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(ranges), &ips, |b, ips| {
            b.iter(|| {
                for &ip in ips {
                    black_box(seeker.locate(ip).ok());
                }
            });
        });
    }

    group.finish();
}

fn bench_region(c: &mut Criterion) {
    let names = ["浙江省杭州市", "广西南宁市", "北京市", "香港", "美国", "局域网"];
    c.bench_function("classify", |b| {
        b.iter(|| {
            for name in names {
                black_box(ipseek::classify(black_box(name)));
            }
        });
    });
}

criterion_group!(benches, bench_access_modes, bench_locate, bench_region);
criterion_main!(benches);
