use thiserror::Error;

/// Errors produced while unpacking an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("gzip stream error: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("entry read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction aborted after {files} files, limit is {max_files}")]
    TooManyFiles { files: usize, max_files: usize },

    #[error("extraction aborted at {bytes} bytes, limit is {max_bytes}")]
    TooManyBytes { bytes: u64, max_bytes: u64 },
}
