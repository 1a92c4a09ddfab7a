//! String table decoding
//!
//! Strings are NUL-terminated and encoded in GBK. A string longer than the
//! configured scratch limit is rejected as a corrupt record instead of being
//! truncated.

use crate::error::{Result, SeekerError};
use crate::source::ByteSource;
use encoding_rs::GBK;

/// Reads NUL-terminated GBK strings from a byte source
#[derive(Clone, Copy)]
pub struct StringDecoder<'a> {
    source: &'a dyn ByteSource,
    limit: usize,
}

impl<'a> StringDecoder<'a> {
    /// Create a decoder with the given per-string byte limit
    pub fn new(source: &'a dyn ByteSource, limit: usize) -> Self {
        Self { source, limit }
    }

    /// Decode the string at `offset`
    pub fn decode(&self, offset: u64) -> Result<String> {
        self.decode_with_len(offset).map(|(text, _)| text)
    }

    /// Decode the string at `offset`, also returning its encoded length
    /// (terminator excluded) so callers can step past it
    pub fn decode_with_len(&self, offset: u64) -> Result<(String, u64)> {
        let bytes = self.source.read_cstr(offset, self.limit)?;
        let len = bytes.len() as u64;
        Ok((decode_gbk(&bytes), len))
    }
}

/// Decode GBK bytes, replacing malformed sequences
pub fn decode_gbk(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    let (text, _) = GBK.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Encode text as GBK, failing on characters GBK cannot represent
pub fn encode_gbk(text: &str) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = GBK.encode(text);
    if had_errors {
        return Err(SeekerError::Build(format!(
            "text cannot be encoded as GBK: {:?}",
            text
        )));
    }
    if bytes.contains(&0) {
        return Err(SeekerError::Build(format!(
            "text contains a NUL byte: {:?}",
            text
        )));
    }
    Ok(bytes.into_owned())
}
