//! POSIX ustar (tar) archive parser
//!
//! This crate walks tar archives held in memory without copying entry
//! data. It reads the header fields needed to enumerate files (name,
//! size, typeflag) and tolerates the common real-world deviations:
//! pre-POSIX NUL typeflags, blank size fields on directories, and
//! archives missing the end-of-archive marker.

pub mod archive;
pub mod error;
pub mod header;

pub use archive::{TarArchive, TarEntries, TarEntry};
pub use error::TarError;
pub use header::{
    BLOCK_SIZE, MAGIC_OFFSET, TYPEFLAG_DIRECTORY, TYPEFLAG_REGULAR, TYPEFLAG_REGULAR_OLD,
    USTAR_MAGIC, TarHeader, has_ustar_magic,
};

/// Result type for tar parsing operations
pub type Result<T> = std::result::Result<T, TarError>;
