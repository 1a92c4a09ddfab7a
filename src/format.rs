//! On-disk layout of the location database
//!
//! ```text
//! offset 0..4   : index_begin (u32 LE)  offset of the first index entry
//! offset 4..8   : index_end   (u32 LE)  offset of the LAST index entry
//! [index_begin .. index_end + 7) : sorted index table, 7 bytes per entry
//!     [0..4) begin IP   (u32 LE, octets reversed)
//!     [4..7) record offset (u24 LE)
//! <scattered>   : records   [end IP (u32 LE)] [flag byte | inline string]
//! <scattered>   : strings   NUL-terminated GBK text
//! ```
//!
//! The final index entry is the terminal entry; by convention its area text
//! carries the database edition.

use crate::endian::{ip_from_stored, u24_from_le};
use crate::error::{Result, SeekerError};
use std::net::Ipv4Addr;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 8;

/// Bytes per index entry (4-byte begin IP + 3-byte record offset)
pub const RECORD_STRIDE: u32 = 7;

/// Bytes per stored IP field
pub const IP_SIZE: u32 = 4;

/// Bytes per stored pointer
pub const POINTER_SIZE: u32 = 3;

/// Flag byte: the country AND area live at the 3-byte pointer that follows
pub const AREA_FOLLOWED: u8 = 0x01;

/// Flag byte: only the country lives at the 3-byte pointer that follows;
/// the area comes right after the pointer
pub const NO_AREA: u8 = 0x02;

/// Default scratch limit for a single decoded string, in bytes
pub const DEFAULT_MAX_STRING_LEN: usize = 256;

/// Raw header as stored at offset 0
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RawHeader {
    /// Offset of the first index entry
    pub index_begin: U32,
    /// Offset of the last index entry
    pub index_end: U32,
}

/// Raw index entry as stored in the index table
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RawIndexEntry {
    /// Begin IP in stored (reversed) byte order
    pub begin_ip: [u8; 4],
    /// Record offset, 24-bit little-endian
    pub record_offset: [u8; 3],
}

impl RawIndexEntry {
    /// Begin IP of the range this entry covers
    pub fn begin_ip(&self) -> Ipv4Addr {
        ip_from_stored(self.begin_ip)
    }

    /// Absolute offset of the record holding the end IP and location
    pub fn record_offset(&self) -> u32 {
        let [b0, b1, b2] = self.record_offset;
        u24_from_le(b0, b1, b2)
    }
}

/// Validated header offsets bounding the index table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Offset of the first index entry
    pub index_begin: u32,
    /// Offset of the last index entry
    pub index_end: u32,
}

impl Header {
    /// Parse the 8 header bytes and check the index table against the file size
    ///
    /// Rejects a reversed range, a range that is not a whole number of
    /// entries, and a table that runs past the end of the file.
    pub fn parse(bytes: &[u8], file_len: u64) -> Result<Self> {
        let raw = RawHeader::read_from_prefix(bytes)
            .map(|(raw, _)| raw)
            .map_err(|_| {
                SeekerError::InvalidHeader(format!(
                    "file too small: {} bytes (need at least {})",
                    bytes.len(),
                    HEADER_SIZE
                ))
            })?;

        let header = Header {
            index_begin: raw.index_begin.get(),
            index_end: raw.index_end.get(),
        };
        header.validate(file_len)?;
        Ok(header)
    }

    fn validate(&self, file_len: u64) -> Result<()> {
        if self.index_end < self.index_begin {
            return Err(SeekerError::InvalidHeader(format!(
                "index end {} precedes index begin {}",
                self.index_end, self.index_begin
            )));
        }
        if (self.index_end - self.index_begin) % RECORD_STRIDE != 0 {
            return Err(SeekerError::InvalidHeader(format!(
                "index span {} is not a multiple of {}",
                self.index_end - self.index_begin,
                RECORD_STRIDE
            )));
        }
        if (self.index_begin as u64) < HEADER_SIZE as u64 {
            return Err(SeekerError::InvalidHeader(format!(
                "index begin {} overlaps the header",
                self.index_begin
            )));
        }
        let table_end = self.index_end as u64 + RECORD_STRIDE as u64;
        if table_end > file_len {
            return Err(SeekerError::InvalidHeader(format!(
                "index table ends at {} but file is {} bytes",
                table_end, file_len
            )));
        }
        Ok(())
    }

    /// Total number of index entries, terminal entry included
    pub fn entry_count(&self) -> u32 {
        (self.index_end - self.index_begin) / RECORD_STRIDE + 1
    }

    /// Number of data entries (everything before the terminal entry)
    pub fn data_entry_count(&self) -> u32 {
        (self.index_end - self.index_begin) / RECORD_STRIDE
    }

    /// Offset of the `n`th index entry
    pub fn entry_offset(&self, n: u32) -> u32 {
        self.index_begin + n * RECORD_STRIDE
    }

    /// Encode for writing
    pub fn to_raw(&self) -> RawHeader {
        RawHeader {
            index_begin: U32::new(self.index_begin),
            index_end: U32::new(self.index_end),
        }
    }
}

/// How the bytes at a record position lead to a string
///
/// Decoded once from the flag byte, then dispatched by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// The flag byte is the first byte of a string stored in place
    Inline,
    /// `NO_AREA`: one hop to the country string; area follows the pointer
    SingleRedirect(u32),
    /// `AREA_FOLLOWED`: one hop to a country+area block, which may itself
    /// hold a `SingleRedirect` for the country
    DoubleRedirect(u32),
}

impl Redirect {
    /// Classify a flag byte, taking the pointer bytes that follow it
    pub fn from_flag(flag: u8, pointer: impl FnOnce() -> Result<u32>) -> Result<Self> {
        Ok(match flag {
            AREA_FOLLOWED => Redirect::DoubleRedirect(pointer()?),
            NO_AREA => Redirect::SingleRedirect(pointer()?),
            _ => Redirect::Inline,
        })
    }

    /// True for the two pointer forms
    pub fn is_redirect(&self) -> bool {
        !matches!(self, Redirect::Inline)
    }
}
