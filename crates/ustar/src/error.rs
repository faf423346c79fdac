use thiserror::Error;

/// Errors produced while walking a tar byte stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TarError {
    /// Fewer than 512 bytes remained where a header block was expected.
    #[error("truncated header at offset {offset}: {remaining} bytes remaining, header needs 512")]
    TruncatedHeader { offset: usize, remaining: usize },

    /// The size field did not hold an octal number.
    #[error("invalid size field in header at offset {offset}: {found:?}")]
    InvalidSize { offset: usize, found: String },

    /// The header declared more payload bytes than the stream contains.
    #[error("truncated payload at offset {offset}: header declares {declared} bytes, {available} available")]
    TruncatedPayload {
        offset: usize,
        declared: u64,
        available: usize,
    },
}
