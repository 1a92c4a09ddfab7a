//! Record resolution: from a record offset to a decoded country/area pair
//!
//! A record is a 4-byte end IP followed by the location. The location is
//! either stored in place or reached through pointers, as announced by a
//! flag byte:
//!
//! ```text
//! [end ip][0x01][ptr] ──► [0x02][ptr] ──► "country\0"     area after ptr
//!                     └─► "country\0" area...
//! [end ip][0x02][ptr] ──► "country\0"                      area after ptr
//! [end ip]"country\0" area...
//!
//! area: [0x01|0x02][ptr] ──► "area\0"   (ptr 0 = unknown)
//!       "area\0"
//! ```
//!
//! Country resolution takes at most two hops and area resolution at most
//! one; anything deeper is reported as a corrupt record.

use crate::decode::StringDecoder;
use crate::error::{Result, SeekerError};
use crate::format::{Redirect, AREA_FOLLOWED, IP_SIZE, NO_AREA, POINTER_SIZE};
use crate::source::ByteSource;
use serde::Serialize;
use std::fmt;

/// Country text returned when no record could be resolved
pub const UNKNOWN_COUNTRY: &str = "未知国家";

/// Area text returned when no record could be resolved, or when an area
/// pointer is zero
pub const UNKNOWN_AREA: &str = "未知地区";

/// Publisher marker used as placeholder area text in the database
pub const AUTHOR_MARKER: &str = "CZ88.NET";

/// Decoded location for an address range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    /// Country (or, for Chinese ranges, province/city) text
    pub country: String,
    /// Area text, usually the ISP or a finer place name
    pub area: String,
}

impl Location {
    /// Create a location from its two parts
    pub fn new(country: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            area: area.into(),
        }
    }

    /// The unknown sentinel pair
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_COUNTRY, UNKNOWN_AREA)
    }

    /// True for the unknown sentinel pair
    pub fn is_unknown(&self) -> bool {
        self.country == UNKNOWN_COUNTRY && self.area == UNKNOWN_AREA
    }

    /// Country and area joined, with the publisher marker removed
    pub fn address(&self) -> String {
        let joined = format!("{}{}", self.country, self.area);
        joined.replace(AUTHOR_MARKER, "").trim().to_string()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}

/// Follows redirect flags from a record to its strings
pub struct RecordResolver<'a> {
    source: &'a dyn ByteSource,
    strings: StringDecoder<'a>,
}

impl<'a> RecordResolver<'a> {
    /// Create a resolver; `max_string_len` bounds every decoded string
    pub fn new(source: &'a dyn ByteSource, max_string_len: usize) -> Self {
        Self {
            source,
            strings: StringDecoder::new(source, max_string_len),
        }
    }

    /// Resolve the record at `record_offset` (which points at its end IP)
    pub fn resolve(&self, record_offset: u32) -> Result<Location> {
        let pos = record_offset as u64 + IP_SIZE as u64;

        let (country, area_pos) = match self.redirect_at(pos)? {
            Redirect::DoubleRedirect(target) => self.resolve_country_block(target as u64)?,
            Redirect::SingleRedirect(ptr) => (
                self.strings.decode(ptr as u64)?,
                pos + 1 + POINTER_SIZE as u64,
            ),
            Redirect::Inline => {
                let (country, len) = self.strings.decode_with_len(pos)?;
                (country, pos + len + 1)
            }
        };

        let area = self.resolve_area(area_pos)?;
        Ok(Location { country, area })
    }

    /// Country at the far end of an `AREA_FOLLOWED` hop; returns the text
    /// and the position where the area starts
    fn resolve_country_block(&self, target: u64) -> Result<(String, u64)> {
        match self.redirect_at(target)? {
            Redirect::SingleRedirect(ptr) => Ok((
                self.strings.decode(ptr as u64)?,
                target + 1 + POINTER_SIZE as u64,
            )),
            Redirect::Inline => {
                let (country, len) = self.strings.decode_with_len(target)?;
                Ok((country, target + len + 1))
            }
            Redirect::DoubleRedirect(_) => Err(SeekerError::CorruptRecord(format!(
                "redirect chain at offset {} exceeds two hops",
                target
            ))),
        }
    }

    /// Area text at `offset`: inline, or one pointer hop away
    pub fn resolve_area(&self, offset: u64) -> Result<String> {
        let flag = self.source.read_u8(offset)?;
        if flag == AREA_FOLLOWED || flag == NO_AREA {
            let ptr = self.source.read_u24_le(offset + 1)?;
            if ptr == 0 {
                return Ok(UNKNOWN_AREA.to_string());
            }
            return self.strings.decode(ptr as u64);
        }
        self.strings.decode(offset)
    }

    fn redirect_at(&self, offset: u64) -> Result<Redirect> {
        let flag = self.source.read_u8(offset)?;
        Redirect::from_flag(flag, || self.source.read_u24_le(offset + 1))
    }
}
