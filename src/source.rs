//! Random-offset reads over the database file.
//!
//! Two interchangeable strategies sit behind [`ByteSource`]:
//!
//! - [`BufferSource`]: a contiguous byte buffer. With `Mmap` storage the file
//!   is mapped read-only once and every read is a bounds-checked slice; with
//!   `Vec<u8>` storage the whole file lives in memory.
//! - [`FileSource`]: every read seeks to the offset and reads from the file
//!   handle. Lowest memory footprint, one syscall pair per read.
//!
//! All offsets are absolute file offsets. Multi-byte reads are little-endian
//! on every platform.
//!
//! # Example
//!
//! ```no_run
//! use ipseek::source::{ByteSource, MmapSource};
//!
//! let source = MmapSource::open("qqwry.dat")?;
//! let index_begin = source.read_u32_le(0)?;
//! println!("index begins at {} of {} bytes", index_begin, source.len());
//! # Ok::<(), ipseek::SeekerError>(())
//! ```

use crate::endian::{ip_from_stored, u24_from_le};
use crate::error::{Result, SeekerError};
use memmap2::Mmap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Mutex;

/// Read-only random access to database bytes
///
/// Implementations must be shareable across threads; the seeker hands out
/// `&self` to concurrent queries.
pub trait ByteSource: Send + Sync {
    /// Total size of the source in bytes
    fn len(&self) -> u64;

    /// True when the source holds no bytes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill `buf` from `offset`, failing with `CorruptRecord` past the end
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Read a NUL-terminated byte string starting at `offset`
    ///
    /// The terminator is not included. More than `limit` bytes before the
    /// terminator is a `CorruptRecord`, as is running off the end.
    fn read_cstr(&self, offset: u64, limit: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut pos = offset;
        loop {
            let byte = self.read_u8(pos)?;
            if byte == 0 {
                return Ok(out);
            }
            if out.len() == limit {
                return Err(string_too_long(offset, limit));
            }
            out.push(byte);
            pos += 1;
        }
    }

    /// Read one byte
    fn read_u8(&self, offset: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf[0])
    }

    /// Read `len` bytes into a new buffer
    fn read_bytes(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Read a 24-bit little-endian pointer
    fn read_u24_le(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 3];
        self.read_exact_at(offset, &mut buf)?;
        Ok(u24_from_le(buf[0], buf[1], buf[2]))
    }

    /// Read a 32-bit little-endian integer
    fn read_u32_le(&self, offset: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read a stored IP field, undoing the on-disk byte order
    fn read_ip(&self, offset: u64) -> Result<Ipv4Addr> {
        let mut buf = [0u8; 4];
        self.read_exact_at(offset, &mut buf)?;
        Ok(ip_from_stored(buf))
    }
}

fn string_too_long(offset: u64, limit: usize) -> SeekerError {
    SeekerError::CorruptRecord(format!(
        "string at offset {} exceeds {} bytes without a terminator",
        offset, limit
    ))
}

/// A contiguous, fully addressable buffer of database bytes
pub struct BufferSource<B> {
    buffer: B,
}

/// Memory-mapped database file
pub type MmapSource = BufferSource<Mmap>;

/// Database file loaded into memory
pub type MemorySource = BufferSource<Vec<u8>>;

impl<B: AsRef<[u8]>> BufferSource<B> {
    /// Wrap an existing buffer
    pub fn new(buffer: B) -> Self {
        Self { buffer }
    }

    /// Get a slice of the entire buffer
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Get a slice at a specific offset with bounds checking.
    ///
    /// Returns `None` if the offset + length would exceed the buffer size.
    pub fn get_slice(&self, offset: u64, length: usize) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(length)?;
        self.as_slice().get(start..end)
    }
}

impl MmapSource {
    /// Open and memory-map a database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SeekerError::DatabaseUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        // SAFETY: the mapping is read-only and the database is never written
        // while open; a concurrent external writer is outside our contract.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            SeekerError::DatabaseUnavailable(format!("Failed to mmap {}: {}", path.display(), e))
        })?;
        Ok(Self::new(mmap))
    }
}

impl MemorySource {
    /// Read the whole file into memory, decompressing `.gz` files
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = crate::file_reader::read_all(path).map_err(|e| {
            SeekerError::DatabaseUnavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(Self::new(bytes))
    }
}

impl<B: AsRef<[u8]> + Send + Sync> ByteSource for BufferSource<B> {
    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let slice = self
            .get_slice(offset, buf.len())
            .ok_or_else(|| SeekerError::out_of_bounds(offset, buf.len(), self.len()))?;
        buf.copy_from_slice(slice);
        Ok(())
    }

    fn read_u8(&self, offset: u64) -> Result<u8> {
        self.get_slice(offset, 1)
            .map(|s| s[0])
            .ok_or_else(|| SeekerError::out_of_bounds(offset, 1, self.len()))
    }

    fn read_cstr(&self, offset: u64, limit: usize) -> Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .ok()
            .filter(|&s| s < self.as_slice().len())
            .ok_or_else(|| SeekerError::out_of_bounds(offset, 1, self.len()))?;
        let tail = &self.as_slice()[start..];
        // Only look one byte past the limit for the terminator
        let window = &tail[..tail.len().min(limit.saturating_add(1))];
        match memchr::memchr(0, window) {
            Some(end) => Ok(window[..end].to_vec()),
            None if window.len() > limit => Err(string_too_long(offset, limit)),
            None => Err(SeekerError::CorruptRecord(format!(
                "string at offset {} runs past end of file",
                offset
            ))),
        }
    }
}

impl<B: AsRef<[u8]>> fmt::Debug for BufferSource<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferSource")
            .field("size", &self.as_slice().len())
            .finish()
    }
}

/// Seek-and-read access through a shared file handle
///
/// The handle sits behind a mutex so one `FileSource` can serve concurrent
/// queries; each read holds the lock for its seek and read.
pub struct FileSource {
    file: Mutex<File>,
    size: u64,
}

impl FileSource {
    /// Open a database file for seek-and-read access
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SeekerError::DatabaseUnavailable(format!("Failed to open {}: {}", path.display(), e))
        })?;
        let size = file
            .metadata()
            .map_err(|e| {
                SeekerError::DatabaseUnavailable(format!(
                    "Failed to stat {}: {}",
                    path.display(),
                    e
                ))
            })?
            .len();
        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }

    fn check_bounds(&self, offset: u64, len: usize) -> Result<()> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(SeekerError::out_of_bounds(offset, len, self.size)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|_| SeekerError::Io("file handle lock poisoned".to_string()))
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> u64 {
        self.size
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.check_bounds(offset, buf.len())?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn read_cstr(&self, offset: u64, limit: usize) -> Result<Vec<u8>> {
        self.check_bounds(offset, 1)?;
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))?;

        // Small buffer: strings are short and the handle is shared
        let reader = BufReader::with_capacity(64, &mut *file);
        let mut out = Vec::new();
        reader
            .take((limit as u64).saturating_add(1))
            .read_until(0, &mut out)?;
        match out.last() {
            Some(0) => {
                out.pop();
                Ok(out)
            }
            _ if out.len() > limit => Err(string_too_long(offset, limit)),
            _ => Err(SeekerError::CorruptRecord(format!(
                "string at offset {} runs past end of file",
                offset
            ))),
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("size", &self.size)
            .finish()
    }
}
