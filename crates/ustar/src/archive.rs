use crate::header::{BLOCK_SIZE, TarHeader};
use crate::{Result, TarError};

/// A tar archive held fully in memory.
///
/// Parsing borrows from the source slice; entry names and payloads are
/// never copied.
#[derive(Debug, Clone, Copy)]
pub struct TarArchive<'a> {
    data: &'a [u8],
}

impl<'a> TarArchive<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Iterates over entries in archive order.
    pub fn entries(&self) -> TarEntries<'a> {
        TarEntries {
            data: self.data,
            offset: 0,
            done: false,
        }
    }
}

/// A single archive entry borrowing name and payload from the source.
#[derive(Debug, Clone, Copy)]
pub struct TarEntry<'a> {
    name: &'a [u8],
    typeflag: u8,
    data: &'a [u8],
}

impl<'a> TarEntry<'a> {
    /// Entry name with NUL padding removed.
    #[inline]
    pub fn name_bytes(&self) -> &'a [u8] {
        self.name
    }

    /// Entry name as UTF-8, or `None` when the bytes do not decode.
    pub fn name(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }

    #[inline]
    pub fn typeflag(&self) -> u8 {
        self.typeflag
    }

    /// True for regular-file entries (`'0'` or the pre-POSIX NUL flag).
    pub fn is_regular_file(&self) -> bool {
        matches!(
            self.typeflag,
            crate::header::TYPEFLAG_REGULAR | crate::header::TYPEFLAG_REGULAR_OLD
        )
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// Iterator over archive entries.
///
/// Every entry is yielded, directories included; callers filter on
/// [`TarEntry::is_regular_file`]. Iteration stops at the first all-zero
/// block, at the end of the data, or after the first error.
#[derive(Debug)]
pub struct TarEntries<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Iterator for TarEntries<'a> {
    type Item = Result<TarEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let data = self.data;
        let remaining = data.len() - self.offset;
        if remaining == 0 {
            // Archives missing the end-of-archive marker are tolerated.
            self.done = true;
            return None;
        }
        if remaining < BLOCK_SIZE {
            self.done = true;
            return Some(Err(TarError::TruncatedHeader {
                offset: self.offset,
                remaining,
            }));
        }

        let header = TarHeader::new(&data[self.offset..self.offset + BLOCK_SIZE], self.offset);
        if header.is_end_marker() {
            self.done = true;
            return None;
        }

        let declared = match header.size() {
            Ok(size) => size,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let payload_start = self.offset + BLOCK_SIZE;
        let available = data.len() - payload_start;
        if declared > available as u64 {
            self.done = true;
            return Some(Err(TarError::TruncatedPayload {
                offset: payload_start,
                declared,
                available,
            }));
        }
        let size = declared as usize;

        let entry = TarEntry {
            name: header.name_bytes(),
            typeflag: header.typeflag(),
            data: &data[payload_start..payload_start + size],
        };

        // Payload is padded out to the block boundary; a final entry
        // written without padding is tolerated.
        let padded = size.div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        self.offset = (payload_start + padded).min(data.len());
        Some(Ok(entry))
    }
}
