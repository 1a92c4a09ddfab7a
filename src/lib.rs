//! ipseek - IPv4 Geolocation Lookups over Offset-Addressed Databases
//!
//! ipseek answers "where is this IPv4 address?" from a compact binary
//! database in the widely distributed `qqwry.dat` layout: a sorted index of
//! address ranges pointing into a record area of legacy GBK strings, with
//! 24-bit redirect pointers used to share repeated names.
//!
//! # Quick Start
//!
//! ```rust
//! use ipseek::{DatabaseBuilder, Seeker};
//!
//! let mut builder = DatabaseBuilder::new();
//! builder.add_entry("1.2.3.0", "1.2.3.255", "CN", "Beijing")?;
//! builder.add_entry("61.164.0.0", "61.164.255.255", "浙江省杭州市", "电信")?;
//! let bytes = builder.build()?;
//! # let tmp_path = std::env::temp_dir().join("ipseek_doctest_quickstart.dat");
//! # std::fs::write(&tmp_path, bytes)?;
//!
//! # let seeker = Seeker::open(&tmp_path)?;
//! # let _ = std::fs::remove_file(&tmp_path);
//! # /*
//! let seeker = Seeker::open("qqwry.dat")?;
//! # */
//! assert_eq!(seeker.country("1.2.3.4"), "CN");
//! assert_eq!(seeker.area("1.2.3.4"), "Beijing");
//!
//! let region = seeker.region("61.164.0.1");
//! assert_eq!(region.province.as_deref(), Some("浙江省"));
//! assert_eq!(region.city.as_deref(), Some("杭州市"));
//!
//! // Addresses outside every range get the unknown sentinel
//! assert_eq!(seeker.country("9.9.9.9"), ipseek::UNKNOWN_COUNTRY);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ header: index_begin, index_end (u32) │  offset 0
//! ├──────────────────────────────────────┤
//! │ record area                          │
//! │   [end ip][flag|country][area]       │  strings NUL-terminated GBK,
//! │   ...                                │  0x01/0x02 + u24 = redirect
//! ├──────────────────────────────────────┤
//! │ index: [begin ip u32][record u24]    │  index_begin ..= index_end
//! │   ...                                │  7 bytes per entry
//! └──────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian.
//!
//! # Access Modes
//!
//! A database can be memory-mapped (default), read through seeks on a file
//! handle, or loaded into memory. See [`SeekerOpener`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod cache;
pub mod decode;
pub mod endian;
pub mod error;
pub mod file_reader;
pub mod format;
pub mod locate;
pub mod record;
pub mod region;
pub mod seeker;
pub mod source;

pub use crate::builder::DatabaseBuilder;
pub use crate::cache::CacheStats;
pub use crate::error::{Result, SeekerError};
pub use crate::format::Header;
pub use crate::record::{Location, UNKNOWN_AREA, UNKNOWN_COUNTRY};
pub use crate::region::{classify, Region};
pub use crate::seeker::{AccessMode, IpEntry, Seeker, SeekerOpener, SeekerOptions};
pub use crate::source::ByteSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
