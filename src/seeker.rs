//! IP location seeker
//!
//! [`Seeker`] owns a byte source and the validated header of one database
//! file. A query goes through the location cache first; on a miss it runs
//! the index search and record decoding, then stores the result.
//!
//! Query methods never fail: a disabled seeker, an unparsable address, an
//! address outside every range and a corrupt record all answer with the
//! unknown sentinel. The `try_*`, [`Seeker::locate`] and [`Seeker::resolve`]
//! methods expose the underlying errors.

use crate::cache::{CacheStats, LocationCache};
use crate::error::{Result, SeekerError};
use crate::file_reader;
use crate::format::{Header, DEFAULT_MAX_STRING_LEN, HEADER_SIZE};
use crate::locate::IndexLocator;
use crate::record::{Location, RecordResolver};
use crate::region::{classify, Region};
use crate::source::{ByteSource, FileSource, MemorySource, MmapSource};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;

/// How the database file is read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// Map the file read-only (default)
    #[default]
    Mmap,
    /// Seek and read through a file handle for every access
    File,
    /// Read the whole file into memory
    Memory,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessMode::Mmap => "mmap",
            AccessMode::File => "file",
            AccessMode::Memory => "memory",
        })
    }
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mmap" => Ok(AccessMode::Mmap),
            "file" | "seek" => Ok(AccessMode::File),
            "memory" | "mem" => Ok(AccessMode::Memory),
            other => Err(format!(
                "unknown access mode '{}' (expected mmap, file or memory)",
                other
            )),
        }
    }
}

/// Options for opening a seeker
#[derive(Debug, Clone)]
pub struct SeekerOptions {
    /// Path to the database file (ignored when `bytes` is set)
    pub path: PathBuf,
    /// How to read the file
    pub access_mode: AccessMode,
    /// Memoize query results
    pub cache_enabled: bool,
    /// Longest string accepted before a record counts as corrupt
    pub max_string_len: usize,
    /// Optional in-memory database bytes
    pub bytes: Option<Vec<u8>>,
}

impl Default for SeekerOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            access_mode: AccessMode::default(),
            cache_enabled: true,
            max_string_len: DEFAULT_MAX_STRING_LEN,
            bytes: None,
        }
    }
}

/// Builder for opening seekers with custom configuration
///
/// Created via `Seeker::from(path)`.
///
/// # Examples
///
/// ```no_run
/// use ipseek::Seeker;
///
/// // Defaults: memory-mapped, cached
/// let seeker = Seeker::from("qqwry.dat").open()?;
///
/// // Seek-and-read, no cache
/// let seeker = Seeker::from("qqwry.dat").seek_file().no_cache().open()?;
/// # Ok::<(), ipseek::SeekerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SeekerOpener {
    options: SeekerOptions,
}

impl SeekerOpener {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            options: SeekerOptions {
                path: path.into(),
                ..Default::default()
            },
        }
    }

    /// Choose how the file is read
    pub fn access_mode(mut self, mode: AccessMode) -> Self {
        self.options.access_mode = mode;
        self
    }

    /// Memory-map the file (default)
    pub fn mmap(self) -> Self {
        self.access_mode(AccessMode::Mmap)
    }

    /// Seek and read through a file handle
    pub fn seek_file(self) -> Self {
        self.access_mode(AccessMode::File)
    }

    /// Load the whole file into memory
    pub fn in_memory(self) -> Self {
        self.access_mode(AccessMode::Memory)
    }

    /// Disable the location cache
    pub fn no_cache(mut self) -> Self {
        self.options.cache_enabled = false;
        self
    }

    /// Set the per-string byte limit
    pub fn max_string_len(mut self, len: usize) -> Self {
        self.options.max_string_len = len;
        self
    }

    /// Open, failing on a missing file or a bad header
    pub fn open(self) -> Result<Seeker> {
        Seeker::open_with_options(self.options)
    }

    /// Open, falling back to a disabled seeker on failure
    ///
    /// The failure is logged; every query on the returned seeker answers
    /// with the unknown sentinel.
    pub fn open_lenient(self) -> Seeker {
        let path = self.options.path.clone();
        match self.open() {
            Ok(seeker) => seeker,
            Err(e) => {
                log::warn!(
                    "location database {} disabled: {}",
                    path.display(),
                    e
                );
                Seeker::disabled()
            }
        }
    }
}

/// One index entry with its decoded location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpEntry {
    /// First address of the range
    pub begin_ip: Ipv4Addr,
    /// Last address of the range
    pub end_ip: Ipv4Addr,
    /// Country text
    pub country: String,
    /// Area text
    pub area: String,
}

impl IpEntry {
    /// The entry's location
    pub fn location(&self) -> Location {
        Location::new(self.country.clone(), self.area.clone())
    }

    /// True if the range contains `ip`
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.begin_ip <= ip && ip <= self.end_ip
    }
}

/// Source plus validated header: everything a lookup needs
struct Engine {
    source: Box<dyn ByteSource>,
    header: Header,
    max_string_len: usize,
}

impl Engine {
    fn locator(&self) -> IndexLocator<'_> {
        IndexLocator::new(self.source.as_ref(), self.header)
    }

    fn resolver(&self) -> RecordResolver<'_> {
        RecordResolver::new(self.source.as_ref(), self.max_string_len)
    }

    fn lookup(&self, ip: Ipv4Addr) -> Result<Option<Location>> {
        match self.locator().locate(ip)? {
            Some(record) => self.resolver().resolve(record).map(Some),
            None => Ok(None),
        }
    }

    fn entry(&self, n: u32) -> Result<IpEntry> {
        let raw = self.locator().entry(n)?;
        let record = raw.record_offset();
        let end_ip = self.source.read_ip(record as u64)?;
        let location = self.resolver().resolve(record)?;
        Ok(IpEntry {
            begin_ip: raw.begin_ip(),
            end_ip,
            country: location.country,
            area: location.area,
        })
    }

    fn end_ip(&self, n: u32) -> Result<Ipv4Addr> {
        let record = self.locator().entry(n)?.record_offset();
        self.source.read_ip(record as u64)
    }
}

/// IP location database handle
///
/// Immutable after construction apart from its cache, and `Send + Sync`:
/// wrap it in an `Arc` to share it across threads.
///
/// # Examples
///
/// ```no_run
/// use ipseek::Seeker;
///
/// let seeker = Seeker::open("qqwry.dat")?;
/// println!("{}", seeker.address("8.8.8.8"));
/// println!("{:?}", seeker.region("61.164.0.1"));
/// # Ok::<(), ipseek::SeekerError>(())
/// ```
pub struct Seeker {
    engine: Option<Engine>,
    cache: Option<LocationCache>,
    access_mode: AccessMode,
}

impl Seeker {
    /// Start configuring a seeker for the file at `path`
    pub fn from(path: impl Into<PathBuf>) -> SeekerOpener {
        SeekerOpener::new(path)
    }

    /// Open with default options (memory-mapped, cached)
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::from(path).open()
    }

    /// Create a seeker over database bytes already in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::open_with_options(SeekerOptions {
            bytes: Some(bytes),
            access_mode: AccessMode::Memory,
            ..Default::default()
        })
    }

    /// Create a seeker over a custom byte source
    ///
    /// `access_mode` is what [`Seeker::access_mode`] reports for it.
    pub fn from_source(source: Box<dyn ByteSource>, access_mode: AccessMode) -> Result<Self> {
        Self::with_source(
            source,
            &SeekerOptions {
                access_mode,
                ..Default::default()
            },
        )
    }

    /// A seeker with no database: every query returns the unknown sentinel
    pub fn disabled() -> Self {
        Self {
            engine: None,
            cache: None,
            access_mode: AccessMode::default(),
        }
    }

    /// Open with explicit options
    ///
    /// A `.gz` database is always decompressed into memory.
    pub fn open_with_options(mut options: SeekerOptions) -> Result<Self> {
        if options.bytes.is_none()
            && options.access_mode != AccessMode::Memory
            && file_reader::is_gzip(&options.path)
        {
            log::debug!(
                "{} is compressed, loading into memory",
                options.path.display()
            );
            options.access_mode = AccessMode::Memory;
        }
        let source: Box<dyn ByteSource> = match options.bytes.take() {
            Some(bytes) => Box::new(MemorySource::new(bytes)),
            None => match options.access_mode {
                AccessMode::Mmap => Box::new(MmapSource::open(&options.path)?),
                AccessMode::File => Box::new(FileSource::open(&options.path)?),
                AccessMode::Memory => Box::new(MemorySource::load(&options.path)?),
            },
        };
        let seeker = Self::with_source(source, &options)?;
        log::debug!(
            "opened location database {} ({}, {} entries)",
            options.path.display(),
            options.access_mode,
            seeker.entry_count()
        );
        Ok(seeker)
    }

    fn with_source(source: Box<dyn ByteSource>, options: &SeekerOptions) -> Result<Self> {
        let size = source.len();
        let available = HEADER_SIZE.min(usize::try_from(size).unwrap_or(HEADER_SIZE));
        let raw = source.read_bytes(0, available)?;
        let header = Header::parse(&raw, size)?;
        log::debug!(
            "header: index {}..={} in {} bytes",
            header.index_begin,
            header.index_end,
            size
        );

        Ok(Self {
            engine: Some(Engine {
                source,
                header,
                max_string_len: options.max_string_len,
            }),
            cache: options.cache_enabled.then(LocationCache::new),
            access_mode: options.access_mode,
        })
    }

    /// False for a disabled seeker
    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    /// Header offsets, if a database is loaded
    pub fn header(&self) -> Option<Header> {
        self.engine.as_ref().map(|e| e.header)
    }

    /// How the database is read
    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Database size in bytes (0 when disabled)
    pub fn file_size(&self) -> u64 {
        self.engine.as_ref().map(|e| e.source.len()).unwrap_or(0)
    }

    /// Number of index entries, terminal entry included (0 when disabled)
    pub fn entry_count(&self) -> u32 {
        self.header().map(|h| h.entry_count()).unwrap_or(0)
    }

    fn engine(&self) -> Result<&Engine> {
        self.engine.as_ref().ok_or_else(|| {
            SeekerError::DatabaseUnavailable("no database loaded".to_string())
        })
    }

    /// Record offset of the range containing `ip`
    pub fn locate(&self, ip: Ipv4Addr) -> Result<Option<u32>> {
        self.engine()?.locator().locate(ip)
    }

    /// Decode the record at `record_offset`
    pub fn resolve(&self, record_offset: u32) -> Result<Location> {
        self.engine()?.resolver().resolve(record_offset)
    }

    /// Uncached lookup exposing every failure
    ///
    /// `Ok(None)` means the address lies outside every range.
    pub fn try_lookup(&self, ip: Ipv4Addr) -> Result<Option<Location>> {
        self.engine()?.lookup(ip)
    }

    /// Location of `ip`, or the unknown sentinel
    pub fn lookup(&self, ip: Ipv4Addr) -> Location {
        let Some(engine) = &self.engine else {
            return Location::unknown();
        };
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(ip)) {
            return hit;
        }
        log::trace!("location cache miss for {}", ip);

        match engine.lookup(ip) {
            Ok(found) => {
                let location = found.unwrap_or_else(Location::unknown);
                match &self.cache {
                    Some(cache) => cache.insert(ip, location),
                    None => location,
                }
            }
            Err(e) => {
                log::debug!("lookup of {} failed: {}", ip, e);
                Location::unknown()
            }
        }
    }

    /// Location of a dotted-quad address, or the unknown sentinel
    pub fn location(&self, ip: &str) -> Location {
        match ip.trim().parse::<Ipv4Addr>() {
            Ok(addr) => self.lookup(addr),
            Err(_) => {
                log::debug!("not an IPv4 address: {:?}", ip);
                Location::unknown()
            }
        }
    }

    /// Country text for `ip`
    pub fn country(&self, ip: &str) -> String {
        self.location(ip).country
    }

    /// Area text for `ip`
    pub fn area(&self, ip: &str) -> String {
        self.location(ip).area
    }

    /// Country and area joined, publisher marker removed
    pub fn address(&self, ip: &str) -> String {
        self.location(ip).address()
    }

    /// Country/province/city decomposition of the country text for `ip`
    pub fn region(&self, ip: &str) -> Region {
        classify(&self.location(ip).country)
    }

    /// End address of every data entry, in index order
    ///
    /// The terminal entry is not included. Restart by calling again.
    pub fn all_ips(&self) -> AllIps<'_> {
        AllIps {
            engine: self.engine.as_ref(),
            next: 0,
            count: self.header().map(|h| h.data_entry_count()).unwrap_or(0),
        }
    }

    /// Every index entry with its location, terminal entry included
    ///
    /// Entries whose record cannot be decoded are skipped.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            engine: self.engine.as_ref(),
            next: 0,
            count: self.entry_count(),
        }
    }

    /// Entries whose country or area contains `fragment`
    pub fn find_by_name_fragment(&self, fragment: &str) -> Vec<IpEntry> {
        self.entries()
            .filter(|e| e.country.contains(fragment) || e.area.contains(fragment))
            .collect()
    }

    /// Database edition text, carried as the terminal entry's area
    pub fn version(&self) -> Option<String> {
        let engine = self.engine.as_ref()?;
        let last = engine.header.entry_count() - 1;
        match engine.entry(last) {
            Ok(entry) => Some(entry.area),
            Err(e) => {
                log::debug!("terminal entry unreadable: {}", e);
                None
            }
        }
    }

    /// Cache counters, if caching is enabled
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    /// Number of cached addresses
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every cached location
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}

impl fmt::Debug for Seeker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seeker")
            .field("enabled", &self.is_enabled())
            .field("access_mode", &self.access_mode)
            .field("header", &self.header())
            .field("cache_entries", &self.cache_len())
            .finish()
    }
}

/// Iterator over data entries' end addresses
pub struct AllIps<'a> {
    engine: Option<&'a Engine>,
    next: u32,
    count: u32,
}

impl Iterator for AllIps<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let engine = self.engine?;
        while self.next < self.count {
            let n = self.next;
            self.next += 1;
            match engine.end_ip(n) {
                Ok(ip) => return Some(ip.to_string()),
                Err(e) => log::warn!("skipping index entry {}: {}", n, e),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.next) as usize;
        (0, Some(remaining))
    }
}

/// Iterator over decoded index entries
pub struct Entries<'a> {
    engine: Option<&'a Engine>,
    next: u32,
    count: u32,
}

impl Iterator for Entries<'_> {
    type Item = IpEntry;

    fn next(&mut self) -> Option<IpEntry> {
        let engine = self.engine?;
        while self.next < self.count {
            let n = self.next;
            self.next += 1;
            match engine.entry(n) {
                Ok(entry) => return Some(entry),
                Err(e) => log::warn!("skipping index entry {}: {}", n, e),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count.saturating_sub(self.next) as usize;
        (0, Some(remaining))
    }
}
