//! Input readers with transparent gzip decompression
//!
//! Range lists fed to the builder and database files handed to the seeker
//! may both be gzip-compressed. Compression is detected from a `.gz`
//! extension (any case).
//!
//! ```rust,no_run
//! use ipseek::file_reader;
//! use std::io::BufRead;
//!
//! let reader = file_reader::open("ranges.csv.gz")?;
//! for line in reader.lines() {
//!     println!("{}", line?);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader, Read};
use std::path::Path;

/// Buffer size for streamed input
const BUFFER_SIZE: usize = 128 * 1024;

/// True if `path` names a gzip file
pub fn is_gzip<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

/// Open a file for buffered reading, decompressing `.gz` files
///
/// The path `-` reads from stdin.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }
    let file = File::open(path)?;
    Ok(from_file(file, is_gzip(path)))
}

/// Wrap an open file, decompressing when `gzip` is set
pub fn from_file(file: File, gzip: bool) -> Box<dyn BufRead + Send> {
    if gzip {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(BUFFER_SIZE, file))
    }
}

/// Read a whole file into memory, decompressing `.gz` files
pub fn read_all<P: AsRef<Path>>(path: P) -> io::Result<Vec<u8>> {
    let mut reader = open(path)?;
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}
