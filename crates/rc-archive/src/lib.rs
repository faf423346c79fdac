//! Resource container archive codec
//!
//! Detects the container format of repository archives by magic bytes and
//! unpacks them fully in memory, with caps on file count and total bytes.
//! Zip is read through the `zip` crate, gzip through `flate2`, and tar
//! through the in-house [`ustar`] parser. Unrecognized data extracts to an
//! empty file list rather than an error.

pub mod error;
pub mod extract;
pub mod format;
pub mod listing;

pub use error::ArchiveError;
pub use extract::{ExtractedFile, ExtractionLimits, extract_all, is_filtered};
pub use format::{ArchiveType, detect_archive_type};
pub use listing::{
    ArchiveSummary, filter_matching, find_by_suffix, find_file, list_paths, normalize_path,
    summarize,
};

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;
