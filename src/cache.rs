//! Location cache
//!
//! Memoizes address -> location results so repeat queries skip the index
//! search and record decoding. Entries are keyed by the canonical dotted-quad
//! text of the address and are never evicted; the cache lives as long as the
//! seeker that owns it.

use crate::record::Location;
use rustc_hash::FxHashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Queries served from the cache
    pub hits: u64,
    /// Queries that required a lookup
    pub misses: u64,
    /// Entries currently held
    pub entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Unbounded, thread-safe address -> location map
#[derive(Debug, Default)]
pub struct LocationCache {
    map: Mutex<FxHashMap<String, Location>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LocationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for an address
    pub fn key(ip: Ipv4Addr) -> String {
        ip.to_string()
    }

    /// Look up a cached location, counting the hit or miss
    pub fn get(&self, ip: Ipv4Addr) -> Option<Location> {
        let found = self
            .map
            .lock()
            .ok()
            .and_then(|map| map.get(&Self::key(ip)).cloned());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store a location; an existing entry for the address is kept
    ///
    /// Returns the cached value, so concurrent resolvers of the same address
    /// all hand back the first stored result.
    pub fn insert(&self, ip: Ipv4Addr, location: Location) -> Location {
        match self.map.lock() {
            Ok(mut map) => map.entry(Self::key(ip)).or_insert(location).clone(),
            Err(_) => location,
        }
    }

    /// Number of cached addresses
    pub fn len(&self) -> usize {
        self.map.lock().map(|map| map.len()).unwrap_or(0)
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries and reset the counters
    pub fn clear(&self) {
        if let Ok(mut map) = self.map.lock() {
            map.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Take a snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
