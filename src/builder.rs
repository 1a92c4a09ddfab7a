//! Location Database Builder
//!
//! Writes new database files in the offset-addressed layout read by
//! [`Seeker`](crate::Seeker). Strings are GBK-encoded and deduplicated with
//! the three record forms the format offers:
//!
//! - first sighting of a country: stored inline in the record
//! - repeated country, new pairing: `NO_AREA` pointer to the earlier string
//! - repeated country+area pair: `AREA_FOLLOWED` pointer to the earlier block
//!
//! Areas repeat through a single pointer hop as well.
//!
//! # Example
//! ```
//! use ipseek::{DatabaseBuilder, Seeker};
//!
//! let mut builder = DatabaseBuilder::new();
//! builder.add_entry("1.0.0.0", "1.0.0.255", "澳大利亚", "APNIC")?;
//! builder.add_entry("1.0.1.0", "1.0.3.255", "福建省", "电信")?;
//!
//! let seeker = Seeker::from_bytes(builder.build()?)?;
//! assert_eq!(seeker.area("1.0.2.1"), "电信");
//! # Ok::<(), ipseek::SeekerError>(())
//! ```

use crate::decode::encode_gbk;
use crate::endian::{ip_to_stored, u24_to_le};
use crate::error::{Result, SeekerError};
use crate::format::{Header, RawIndexEntry, AREA_FOLLOWED, HEADER_SIZE, NO_AREA, RECORD_STRIDE};
use rustc_hash::FxHashMap;
use std::net::Ipv4Addr;
use zerocopy::IntoBytes;

/// One address range with its location text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    /// First address of the range
    pub begin: Ipv4Addr,
    /// Last address of the range (inclusive)
    pub end: Ipv4Addr,
    /// Country text
    pub country: String,
    /// Area text
    pub area: String,
}

/// Location database builder
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    ranges: Vec<RangeEntry>,
}

impl DatabaseBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a range given as dotted-quad strings
    pub fn add_entry(&mut self, begin: &str, end: &str, country: &str, area: &str) -> Result<()> {
        let begin: Ipv4Addr = begin.trim().parse()?;
        let end: Ipv4Addr = end.trim().parse()?;
        self.add_range(begin, end, country, area)
    }

    /// Add a range
    pub fn add_range(
        &mut self,
        begin: Ipv4Addr,
        end: Ipv4Addr,
        country: &str,
        area: &str,
    ) -> Result<()> {
        if begin > end {
            return Err(SeekerError::Build(format!(
                "range begins after it ends: {} > {}",
                begin, end
            )));
        }
        self.ranges.push(RangeEntry {
            begin,
            end,
            country: country.to_string(),
            area: area.to_string(),
        });
        Ok(())
    }

    /// Number of ranges added so far
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if no ranges have been added
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Serialize the database
    ///
    /// Ranges are sorted by begin address; overlapping ranges are rejected.
    /// The last range (in address order) becomes the terminal entry.
    pub fn build(&self) -> Result<Vec<u8>> {
        if self.ranges.is_empty() {
            return Err(SeekerError::Build(
                "database needs at least one range".to_string(),
            ));
        }

        let mut ranges: Vec<&RangeEntry> = self.ranges.iter().collect();
        ranges.sort_by_key(|r| r.begin);
        for pair in ranges.windows(2) {
            if pair[1].begin <= pair[0].end {
                return Err(SeekerError::Build(format!(
                    "overlapping ranges: {}-{} and {}-{}",
                    pair[0].begin, pair[0].end, pair[1].begin, pair[1].end
                )));
            }
        }

        let mut writer = RecordWriter::default();
        let mut index = Vec::with_capacity(ranges.len());
        for range in &ranges {
            let record = writer.write_record(range)?;
            index.push(RawIndexEntry {
                begin_ip: ip_to_stored(range.begin),
                record_offset: pointer_bytes(record)?,
            });
        }

        let mut out = writer.out;
        let index_begin = offset_u32(out.len())?;
        for entry in &index {
            out.extend_from_slice(entry.as_bytes());
        }
        let header = Header {
            index_begin,
            index_end: index_begin + (index.len() as u32 - 1) * RECORD_STRIDE,
        };
        out[..HEADER_SIZE].copy_from_slice(header.to_raw().as_bytes());

        log::debug!(
            "built database: {} ranges, {} bytes, index at {}..={}",
            index.len(),
            out.len(),
            header.index_begin,
            header.index_end
        );
        Ok(out)
    }
}

/// Record area writer with string and block deduplication
struct RecordWriter {
    out: Vec<u8>,
    strings: FxHashMap<String, u32>,
    blocks: FxHashMap<(String, String), u32>,
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self {
            out: vec![0u8; HEADER_SIZE],
            strings: FxHashMap::default(),
            blocks: FxHashMap::default(),
        }
    }
}

impl RecordWriter {
    fn pos(&self) -> Result<u32> {
        offset_u32(self.out.len())
    }

    /// Write one record and return its offset
    fn write_record(&mut self, range: &RangeEntry) -> Result<u32> {
        let record = self.pos()?;
        self.out.extend_from_slice(&ip_to_stored(range.end));

        let key = (range.country.clone(), range.area.clone());
        if let Some(&block) = self.blocks.get(&key) {
            self.write_pointer(AREA_FOLLOWED, block)?;
            return Ok(record);
        }

        let block = self.pos()?;
        self.write_text(&range.country)?;
        self.write_text(&range.area)?;
        self.blocks.insert(key, block);
        Ok(record)
    }

    /// Inline on first sighting, `NO_AREA` pointer afterwards
    fn write_text(&mut self, text: &str) -> Result<()> {
        if let Some(&at) = self.strings.get(text) {
            return self.write_pointer(NO_AREA, at);
        }
        let bytes = encode_gbk(text)?;
        if matches!(bytes.first(), Some(&AREA_FOLLOWED) | Some(&NO_AREA)) {
            return Err(SeekerError::Build(format!(
                "text starts with a redirect flag byte: {:?}",
                text
            )));
        }
        let at = self.pos()?;
        self.out.extend_from_slice(&bytes);
        self.out.push(0);
        self.strings.insert(text.to_string(), at);
        Ok(())
    }

    fn write_pointer(&mut self, flag: u8, target: u32) -> Result<()> {
        self.out.push(flag);
        self.out.extend_from_slice(&pointer_bytes(target)?);
        Ok(())
    }
}

fn pointer_bytes(offset: u32) -> Result<[u8; 3]> {
    u24_to_le(offset).ok_or_else(|| {
        SeekerError::Build(format!(
            "offset {} does not fit a 24-bit pointer (database too large)",
            offset
        ))
    })
}

fn offset_u32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| SeekerError::Build(format!("database exceeds 4 GiB ({} bytes)", len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder_fails() {
        let builder = DatabaseBuilder::new();
        assert!(builder.is_empty());
        assert!(matches!(builder.build(), Err(SeekerError::Build(_))));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let mut builder = DatabaseBuilder::new();
        let result = builder.add_entry("10.0.0.9", "10.0.0.1", "X", "");
        assert!(matches!(result, Err(SeekerError::Build(_))));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut builder = DatabaseBuilder::new();
        let result = builder.add_entry("10.0.0", "10.0.0.1", "X", "");
        assert!(matches!(result, Err(SeekerError::InvalidAddress(_))));
    }

    #[test]
    fn test_overlap_rejected() {
        let mut builder = DatabaseBuilder::new();
        builder.add_entry("10.0.0.0", "10.0.0.255", "A", "").unwrap();
        builder.add_entry("10.0.0.128", "10.0.1.0", "B", "").unwrap();
        assert!(matches!(builder.build(), Err(SeekerError::Build(_))));
    }

    #[test]
    fn test_layout_of_single_range() {
        let mut builder = DatabaseBuilder::new();
        builder.add_entry("1.2.3.0", "1.2.3.255", "CN", "BJ").unwrap();
        let bytes = builder.build().unwrap();

        // header(8) + end ip(4) + "CN\0" + "BJ\0" + one index entry
        assert_eq!(bytes.len(), 8 + 4 + 3 + 3 + 7);
        let header = Header::parse(&bytes, bytes.len() as u64).unwrap();
        assert_eq!(header.index_begin, 18);
        assert_eq!(header.index_end, 18);
        assert_eq!(&bytes[8..12], &[255, 3, 2, 1]);
        assert_eq!(&bytes[12..18], b"CN\0BJ\0");
        assert_eq!(&bytes[18..25], &[0, 3, 2, 1, 8, 0, 0]);
    }

    #[test]
    fn test_repeated_strings_use_pointers() {
        let mut builder = DatabaseBuilder::new();
        builder.add_entry("1.0.0.0", "1.0.0.255", "CN", "BJ").unwrap();
        builder.add_entry("2.0.0.0", "2.0.0.255", "CN", "SH").unwrap();
        builder.add_entry("3.0.0.0", "3.0.0.255", "CN", "BJ").unwrap();
        let bytes = builder.build().unwrap();

        // Second record: end ip, NO_AREA -> "CN", inline "SH"
        let second = 8 + 4 + 6;
        assert_eq!(bytes[second + 4], NO_AREA);
        assert_eq!(&bytes[second + 5..second + 8], &[12, 0, 0]);
        assert_eq!(&bytes[second + 8..second + 11], b"SH\0");

        // Third record: end ip, AREA_FOLLOWED -> first block
        let third = second + 4 + 4 + 3;
        assert_eq!(bytes[third + 4], AREA_FOLLOWED);
        assert_eq!(&bytes[third + 5..third + 8], &[12, 0, 0]);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let mut builder = DatabaseBuilder::new();
        builder.add_entry("9.0.0.0", "9.0.0.255", "B", "").unwrap();
        builder.add_entry("1.0.0.0", "1.0.0.255", "A", "").unwrap();
        let bytes = builder.build().unwrap();
        let header = Header::parse(&bytes, bytes.len() as u64).unwrap();
        let first = &bytes[header.index_begin as usize..header.index_begin as usize + 4];
        assert_eq!(first, &[0, 0, 0, 1]);
    }
}
