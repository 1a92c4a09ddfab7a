//! Little-endian field decoding for the on-disk layout
//!
//! Every multi-byte integer in the database is little-endian regardless of
//! the host platform:
//!
//! - header offsets are `u32`
//! - record and string pointers are 24-bit (`u24`, three bytes)
//! - IPv4 addresses are stored as the little-endian `u32` of the address,
//!   i.e. the dotted-quad octets in reverse order
//!
//! # Usage Pattern
//!
//! ```rust
//! use ipseek::endian::{read_u24_le, read_u32_le, swap_ip_bytes};
//!
//! let buffer = [0x78, 0x56, 0x34, 0x12, 0xAA, 0xBB, 0xCC];
//! assert_eq!(read_u32_le(&buffer, 0), Some(0x12345678));
//! assert_eq!(read_u24_le(&buffer, 4), Some(0xCCBBAA));
//!
//! // 1.2.3.4 on disk
//! assert_eq!(swap_ip_bytes([4, 3, 2, 1]), [1, 2, 3, 4]);
//! ```

use std::net::Ipv4Addr;

/// Largest value a 24-bit pointer can hold
pub const U24_MAX: u32 = 0x00FF_FFFF;

/// Read a u32 in little-endian format from buffer
///
/// Returns `None` when `offset + 4` exceeds the buffer.
#[inline]
pub fn read_u32_le(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a 24-bit pointer in little-endian format from buffer
///
/// Returns `None` when `offset + 3` exceeds the buffer.
#[inline]
pub fn read_u24_le(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(3)?)?;
    Some(u24_from_le(bytes[0], bytes[1], bytes[2]))
}

/// Assemble a 24-bit little-endian value
#[inline(always)]
pub const fn u24_from_le(b0: u8, b1: u8, b2: u8) -> u32 {
    (b0 as u32) | ((b1 as u32) << 8) | ((b2 as u32) << 16)
}

/// Encode a 24-bit pointer; `None` if the value does not fit
#[inline]
pub const fn u24_to_le(value: u32) -> Option<[u8; 3]> {
    if value > U24_MAX {
        return None;
    }
    Some([value as u8, (value >> 8) as u8, (value >> 16) as u8])
}

/// Swap stored IP bytes into dotted-quad order (and back)
///
/// First and last bytes trade places, as do the middle two. The operation is
/// its own inverse.
#[inline(always)]
pub const fn swap_ip_bytes(raw: [u8; 4]) -> [u8; 4] {
    [raw[3], raw[2], raw[1], raw[0]]
}

/// Decode a stored 4-byte IP field
#[inline]
pub fn ip_from_stored(raw: [u8; 4]) -> Ipv4Addr {
    Ipv4Addr::from(swap_ip_bytes(raw))
}

/// Encode an address the way it is stored on disk
#[inline]
pub fn ip_to_stored(ip: Ipv4Addr) -> [u8; 4] {
    swap_ip_bytes(ip.octets())
}
