use flate2::write::GzEncoder;
use flate2::Compression;
use ipseek::{
    AccessMode, DatabaseBuilder, Location, Seeker, SeekerError, UNKNOWN_AREA, UNKNOWN_COUNTRY,
};
use std::io::Write;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::thread;
use tempfile::{NamedTempFile, TempDir};

fn sample_bytes() -> Vec<u8> {
    let mut builder = DatabaseBuilder::new();
    builder.add_entry("1.0.0.0", "1.0.0.255", "澳大利亚", "CZ88.NET").unwrap();
    builder.add_entry("1.0.1.0", "1.0.3.255", "福建省", "电信").unwrap();
    builder.add_entry("1.0.4.0", "1.0.7.255", "澳大利亚", "墨尔本").unwrap();
    builder.add_entry("10.0.0.0", "10.255.255.255", "局域网", "对方和您在同一内部网").unwrap();
    builder.add_entry("61.164.0.0", "61.164.255.255", "浙江省杭州市", "电信").unwrap();
    builder.add_entry("114.114.114.0", "114.114.114.255", "江苏省南京市", "南京信风网络科技有限公司GreatbitDNS服务器").unwrap();
    builder.add_entry("202.96.128.0", "202.96.128.255", "广东省广州市", "电信").unwrap();
    builder.add_entry("220.181.0.0", "220.181.255.255", "北京市", "电信").unwrap();
    builder.add_entry("255.255.255.0", "255.255.255.255", "纯真网络", "2024年10月16日IP数据").unwrap();
    builder.build().unwrap()
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Header, "CN\0Beijing\0" block, one record pointing at it with 0x01, one
/// index entry: the smallest database that exercises a double redirect
fn area_followed_database() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&27u32.to_le_bytes());
    bytes.extend_from_slice(&27u32.to_le_bytes());
    bytes.extend_from_slice(b"CN\0Beijing\0");
    bytes.extend_from_slice(&[255, 3, 2, 1, 0x01, 8, 0, 0]);
    bytes.extend_from_slice(&[0, 3, 2, 1, 19, 0, 0]);
    assert_eq!(bytes.len(), 34);
    bytes
}

/// Three ranges; the middle record's redirect points at a redirect that
/// points at itself
fn looping_database() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&49u32.to_le_bytes());
    bytes.extend_from_slice(&63u32.to_le_bytes());
    bytes.extend_from_slice(b"CN\0Beijing\0"); // 8
    bytes.extend_from_slice(&[0x01, 19, 0, 0]); // 19: loops onto itself
    bytes.extend_from_slice(&[255, 0, 0, 1, 0x01, 8, 0, 0]); // 23: 1.0.0.0/24
    bytes.extend_from_slice(&[255, 0, 0, 2, 0x01, 19, 0, 0]); // 31: 2.0.0.0/24
    bytes.extend_from_slice(&[255, 0, 0, 3]); // 39: 3.0.0.0/24
    bytes.extend_from_slice(b"X\0ver\0");
    bytes.extend_from_slice(&[0, 0, 0, 1, 23, 0, 0]); // 49
    bytes.extend_from_slice(&[0, 0, 0, 2, 31, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 3, 39, 0, 0]);
    assert_eq!(bytes.len(), 70);
    bytes
}

#[test]
fn test_area_followed_record() {
    let seeker = Seeker::from_bytes(area_followed_database()).unwrap();
    assert_eq!(seeker.country("1.2.3.4"), "CN");
    assert_eq!(seeker.area("1.2.3.4"), "Beijing");
    assert_eq!(seeker.address("1.2.3.4"), "CNBeijing");
    assert_eq!(seeker.entry_count(), 1);
    assert_eq!(seeker.all_ips().count(), 0);
}

#[test]
fn test_access_modes_agree() {
    let file = write_temp(&sample_bytes());
    let queries = [
        "0.0.0.0",
        "1.0.0.1",
        "1.0.2.1",
        "1.0.7.255",
        "9.9.9.9",
        "10.1.2.3",
        "61.164.12.1",
        "114.114.114.114",
        "202.96.128.86",
        "220.181.38.148",
        "255.255.255.255",
    ];

    let mmap = Seeker::from(file.path()).mmap().open().unwrap();
    let seek = Seeker::from(file.path()).seek_file().open().unwrap();
    let memory = Seeker::from(file.path()).in_memory().open().unwrap();
    assert_eq!(seek.access_mode(), AccessMode::File);

    for ip in queries {
        let expected = mmap.location(ip);
        assert_eq!(seek.location(ip), expected, "file mode, {}", ip);
        assert_eq!(memory.location(ip), expected, "memory mode, {}", ip);
    }
    assert_eq!(mmap.country("1.0.2.1"), "福建省");
    assert_eq!(mmap.area("114.114.114.114"), "南京信风网络科技有限公司GreatbitDNS服务器");
}

#[test]
fn test_author_marker_stripped_from_address() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();
    assert_eq!(seeker.area("1.0.0.1"), "CZ88.NET");
    assert_eq!(seeker.address("1.0.0.1"), "澳大利亚");
    assert_eq!(seeker.address("1.0.5.5"), "澳大利亚墨尔本");
}

#[test]
fn test_unknown_outside_ranges() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();
    for ip in ["0.0.0.0", "0.255.255.255", "1.0.8.0", "9.9.9.9", "230.1.1.1"] {
        assert_eq!(seeker.country(ip), UNKNOWN_COUNTRY, "{}", ip);
        assert_eq!(seeker.area(ip), UNKNOWN_AREA, "{}", ip);
    }
}

#[test]
fn test_region_queries() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();

    let region = seeker.region("61.164.0.1");
    assert_eq!(region.country.as_deref(), Some("中国"));
    assert_eq!(region.province.as_deref(), Some("浙江省"));
    assert_eq!(region.city.as_deref(), Some("杭州市"));

    let region = seeker.region("10.0.0.1");
    assert_eq!(region.province.as_deref(), Some("上海"));

    let region = seeker.region("220.181.38.148");
    assert_eq!(region.city.as_deref(), Some("北京市"));

    assert!(seeker.region("1.0.0.1").is_empty());
    assert!(seeker.region("9.9.9.9").is_empty());
}

#[test]
fn test_all_ips_count_matches_header() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();
    let header = seeker.header().unwrap();
    let ips: Vec<String> = seeker.all_ips().collect();

    assert_eq!(ips.len() as u32, (header.index_end - header.index_begin) / 7);
    for ip in &ips {
        assert!(ip.parse::<Ipv4Addr>().is_ok(), "{}", ip);
    }
    assert_eq!(ips.first().map(String::as_str), Some("1.0.0.255"));
    assert_eq!(ips.last().map(String::as_str), Some("220.181.255.255"));

    // Restartable
    assert_eq!(seeker.all_ips().count(), ips.len());
}

#[test]
fn test_version_from_terminal_entry() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();
    assert_eq!(seeker.version().as_deref(), Some("2024年10月16日IP数据"));
}

#[test]
fn test_find_by_name_fragment() {
    let seeker = Seeker::from_bytes(sample_bytes()).unwrap();

    let telecom = seeker.find_by_name_fragment("电信");
    assert_eq!(telecom.len(), 4);
    assert!(telecom.windows(2).all(|w| w[0].begin_ip < w[1].begin_ip));

    let australia = seeker.find_by_name_fragment("澳大利亚");
    assert_eq!(australia.len(), 2);
    assert_eq!(australia[1].location(), Location::new("澳大利亚", "墨尔本"));

    assert!(seeker.find_by_name_fragment("火星").is_empty());
}

#[test]
fn test_corrupt_record_is_local() {
    let seeker = Seeker::from_bytes(looping_database()).unwrap();

    assert_eq!(seeker.country("1.0.0.9"), "CN");
    assert!(seeker.location("2.0.0.9").is_unknown());
    assert_eq!(seeker.area("3.0.0.9"), "ver");

    let err = seeker.try_lookup(Ipv4Addr::new(2, 0, 0, 9)).unwrap_err();
    assert!(err.is_corrupt_record(), "{:?}", err);

    // Batch operations skip the bad record and keep going
    assert_eq!(seeker.all_ips().count(), 2);
    let entries: Vec<_> = seeker.entries().collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].area, "ver");
    assert_eq!(seeker.find_by_name_fragment("CN").len(), 1);
}

#[test]
fn test_corrupt_record_not_cached() {
    let seeker = Seeker::from_bytes(looping_database()).unwrap();
    seeker.location("2.0.0.9");
    assert_eq!(seeker.cache_len(), 0);
    seeker.location("1.0.0.9");
    assert_eq!(seeker.cache_len(), 1);
}

#[test]
fn test_string_limit() {
    let long_area = "a".repeat(300);
    let mut builder = DatabaseBuilder::new();
    builder.add_entry("1.0.0.0", "1.0.0.255", "X", &long_area).unwrap();
    builder.add_entry("2.0.0.0", "2.0.0.255", "Y", "short").unwrap();
    let bytes = builder.build().unwrap();

    let strict = Seeker::from_bytes(bytes.clone()).unwrap();
    assert!(strict.location("1.0.0.1").is_unknown());
    assert!(strict
        .try_lookup(Ipv4Addr::new(1, 0, 0, 1))
        .unwrap_err()
        .is_corrupt_record());

    let file = write_temp(&bytes);
    let relaxed = Seeker::from(file.path()).max_string_len(512).open().unwrap();
    assert_eq!(relaxed.area("1.0.0.1"), long_area);
}

#[test]
fn test_truncated_file_rejected() {
    let mut bytes = sample_bytes();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        Seeker::from_bytes(bytes),
        Err(SeekerError::InvalidHeader(_))
    ));
}

#[test]
fn test_lenient_open_of_garbage() {
    let file = write_temp(b"not a database");
    let seeker = Seeker::from(file.path()).open_lenient();
    assert!(!seeker.is_enabled());
    assert_eq!(seeker.country("1.0.0.1"), UNKNOWN_COUNTRY);
    assert_eq!(seeker.all_ips().count(), 0);
}

#[test]
fn test_gzip_database() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&sample_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("qqwry.dat.gz");
    std::fs::write(&path, compressed).unwrap();

    let seeker = Seeker::open(&path).unwrap();
    assert_eq!(seeker.access_mode(), AccessMode::Memory);
    assert_eq!(seeker.country("61.164.0.1"), "浙江省杭州市");
}

#[test]
fn test_no_cache() {
    let file = write_temp(&sample_bytes());
    let seeker = Seeker::from(file.path()).no_cache().open().unwrap();
    assert_eq!(seeker.country("1.0.2.1"), "福建省");
    assert_eq!(seeker.country("1.0.2.1"), "福建省");
    assert!(seeker.cache_stats().is_none());
    assert_eq!(seeker.cache_len(), 0);
}

#[test]
fn test_shared_across_threads() {
    let seeker = Arc::new(Seeker::from_bytes(sample_bytes()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let seeker = Arc::clone(&seeker);
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(seeker.country("202.96.128.86"), "广东省广州市");
                    assert!(seeker.location("9.9.9.9").is_unknown());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = seeker.cache_stats().unwrap();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hits + stats.misses, 800);
}

#[test]
fn test_resolve_and_locate() {
    let seeker = Seeker::from_bytes(area_followed_database()).unwrap();
    let record = seeker.locate(Ipv4Addr::new(1, 2, 3, 200)).unwrap().unwrap();
    assert_eq!(record, 19);
    assert_eq!(seeker.resolve(record).unwrap(), Location::new("CN", "Beijing"));
    assert_eq!(seeker.locate(Ipv4Addr::new(1, 2, 4, 0)).unwrap(), None);
}

#[test]
fn test_unbounded_string_limit_in_every_mode() {
    let file = write_temp(&sample_bytes());
    for mode in [AccessMode::Mmap, AccessMode::File, AccessMode::Memory] {
        let seeker = Seeker::from(file.path())
            .access_mode(mode)
            .max_string_len(usize::MAX)
            .open()
            .unwrap();
        assert_eq!(seeker.country("1.0.2.1"), "福建省", "{} mode", mode);
    }
}
