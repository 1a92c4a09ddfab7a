//! Index table search
//!
//! The index is a sorted array of 7-byte entries, each holding the first
//! address of a range and the offset of the record that carries the range's
//! last address. Ranges are contiguous in order and never overlap, so the
//! entry covering an address is the last one whose begin IP is `<=` it; the
//! record's end IP then tells whether the address sits inside the range or in
//! an unmapped gap after it.

use crate::error::{Result, SeekerError};
use crate::format::{Header, RawIndexEntry, RECORD_STRIDE};
use crate::source::ByteSource;
use std::net::Ipv4Addr;
use zerocopy::FromBytes;

/// Binary search over the index table
pub struct IndexLocator<'a> {
    source: &'a dyn ByteSource,
    header: Header,
}

impl<'a> IndexLocator<'a> {
    /// Create a locator over a validated header
    pub fn new(source: &'a dyn ByteSource, header: Header) -> Self {
        Self { source, header }
    }

    /// Find the record offset of the range containing `ip`
    ///
    /// Returns `Ok(None)` when `ip` precedes the first range or falls in a
    /// gap between ranges.
    pub fn locate(&self, ip: Ipv4Addr) -> Result<Option<u32>> {
        let target = u32::from(ip);
        let stride = RECORD_STRIDE;

        let first = self.entry_at(self.header.index_begin)?;
        let first_ip = u32::from(first.begin_ip());
        if target == first_ip {
            return Ok(Some(first.record_offset()));
        }
        if target < first_ip {
            return Ok(None);
        }

        // Invariant: begin_ip(lo) < target, and target < begin_ip(hi) unless
        // hi is still the last entry
        let mut lo = self.header.index_begin;
        let mut hi = self.header.index_end;
        while lo < hi {
            let steps = ((hi - lo) / stride / 2).max(1);
            let mid = lo + steps * stride;
            let entry = self.entry_at(mid)?;
            let mid_ip = u32::from(entry.begin_ip());

            if target > mid_ip {
                lo = mid;
            } else if target < mid_ip {
                hi = if mid == hi { hi - stride } else { mid };
            } else {
                return Ok(Some(entry.record_offset()));
            }
        }

        let record_offset = self.entry_at(lo)?.record_offset();
        let end_ip = self.source.read_ip(record_offset as u64)?;
        if target <= u32::from(end_ip) {
            Ok(Some(record_offset))
        } else {
            Ok(None)
        }
    }

    /// Read the index entry at an absolute offset
    pub fn entry_at(&self, offset: u32) -> Result<RawIndexEntry> {
        let mut buf = [0u8; RECORD_STRIDE as usize];
        self.source.read_exact_at(offset as u64, &mut buf)?;
        RawIndexEntry::read_from_bytes(&buf[..]).map_err(|_| {
            SeekerError::CorruptRecord(format!("unreadable index entry at offset {}", offset))
        })
    }

    /// Read the `n`th index entry
    pub fn entry(&self, n: u32) -> Result<RawIndexEntry> {
        self.entry_at(self.header.entry_offset(n))
    }
}
