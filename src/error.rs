//! Error types for the ipseek library

use std::fmt;

/// Result type alias for seeker operations
pub type Result<T> = std::result::Result<T, SeekerError>;

/// Main error type for seeker operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekerError {
    /// The database file could not be opened or read at construction.
    ///
    /// A seeker opened leniently stays disabled after this and answers
    /// every query with the unknown sentinel.
    DatabaseUnavailable(String),

    /// The 8-byte header does not describe a usable index table
    InvalidHeader(String),

    /// A record or string could not be decoded (read past end of file,
    /// string longer than the scratch limit, redirect chain too deep)
    CorruptRecord(String),

    /// Query text is not a dotted-quad IPv4 address
    InvalidAddress(String),

    /// I/O errors during a query
    Io(String),

    /// Database construction errors
    Build(String),
}

impl SeekerError {
    /// Shorthand for a read that ran past the end of the source
    pub(crate) fn out_of_bounds(offset: u64, len: usize, size: u64) -> Self {
        SeekerError::CorruptRecord(format!(
            "read of {} bytes at offset {} runs past end of file ({} bytes)",
            len, offset, size
        ))
    }

    /// True for failures scoped to a single record
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, SeekerError::CorruptRecord(_))
    }
}

impl fmt::Display for SeekerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeekerError::DatabaseUnavailable(msg) => write!(f, "Database unavailable: {}", msg),
            SeekerError::InvalidHeader(msg) => write!(f, "Invalid header: {}", msg),
            SeekerError::CorruptRecord(msg) => write!(f, "Corrupt record: {}", msg),
            SeekerError::InvalidAddress(msg) => write!(f, "Invalid IPv4 address: {}", msg),
            SeekerError::Io(msg) => write!(f, "I/O error: {}", msg),
            SeekerError::Build(msg) => write!(f, "Build error: {}", msg),
        }
    }
}

impl std::error::Error for SeekerError {}

impl From<std::io::Error> for SeekerError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            SeekerError::CorruptRecord(err.to_string())
        } else {
            SeekerError::Io(err.to_string())
        }
    }
}

impl From<std::net::AddrParseError> for SeekerError {
    fn from(err: std::net::AddrParseError) -> Self {
        SeekerError::InvalidAddress(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_maps_to_corrupt_record() {
        let err: SeekerError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert!(err.is_corrupt_record());

        let err: SeekerError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, SeekerError::Io(_)));
    }

    #[test]
    fn test_display() {
        let err = SeekerError::out_of_bounds(100, 4, 64);
        assert_eq!(
            err.to_string(),
            "Corrupt record: read of 4 bytes at offset 100 runs past end of file (64 bytes)"
        );
    }
}
