use crate::{Result, TarError};

/// Size of a tar header or data block in bytes.
pub const BLOCK_SIZE: usize = 512;

/// Offset of the magic field within a header block.
pub const MAGIC_OFFSET: usize = 257;

/// POSIX ustar magic value, without the version suffix.
pub const USTAR_MAGIC: &[u8; 5] = b"ustar";

/// Typeflag byte for a regular file.
pub const TYPEFLAG_REGULAR: u8 = b'0';
/// Pre-POSIX archives mark regular files with a NUL typeflag.
pub const TYPEFLAG_REGULAR_OLD: u8 = 0;
/// Typeflag byte for a directory entry.
pub const TYPEFLAG_DIRECTORY: u8 = b'5';

const NAME_LEN: usize = 100;
const SIZE_OFFSET: usize = 124;
const SIZE_LEN: usize = 12;
const TYPEFLAG_OFFSET: usize = 156;

/// Returns true when `data` carries the ustar magic at the header offset.
///
/// Pre-POSIX archives omit the magic, so `false` does not rule tar out;
/// a `true` confirms it.
#[inline]
pub fn has_ustar_magic(data: &[u8]) -> bool {
    data.len() > MAGIC_OFFSET + USTAR_MAGIC.len()
        && &data[MAGIC_OFFSET..MAGIC_OFFSET + USTAR_MAGIC.len()] == USTAR_MAGIC
}

/// Borrowed view over a single 512-byte header block.
#[derive(Debug, Clone, Copy)]
pub struct TarHeader<'a> {
    block: &'a [u8],
    /// Byte offset of this header within the archive, for error reporting.
    offset: usize,
}

impl<'a> TarHeader<'a> {
    /// Wraps a header block. The caller guarantees `block` is exactly
    /// [`BLOCK_SIZE`] bytes.
    pub(crate) fn new(block: &'a [u8], offset: usize) -> Self {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        Self { block, offset }
    }

    /// An all-zero block marks the end of the archive.
    pub fn is_end_marker(&self) -> bool {
        self.block.iter().all(|&b| b == 0)
    }

    /// Entry name with NUL padding removed. A name occupying the full
    /// field carries no terminator.
    pub fn name_bytes(&self) -> &'a [u8] {
        let block = self.block;
        let raw = &block[..NAME_LEN];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &raw[..end]
    }

    /// Entry name as UTF-8, or `None` when the bytes do not decode.
    pub fn name(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name_bytes()).ok()
    }

    /// Payload size parsed from the octal size field.
    pub fn size(&self) -> Result<u64> {
        parse_octal(
            &self.block[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN],
            self.offset,
        )
    }

    #[inline]
    pub fn typeflag(&self) -> u8 {
        self.block[TYPEFLAG_OFFSET]
    }

    /// True for regular-file entries (`'0'` or the pre-POSIX NUL flag).
    pub fn is_regular_file(&self) -> bool {
        matches!(self.typeflag(), TYPEFLAG_REGULAR | TYPEFLAG_REGULAR_OLD)
    }
}

/// Parses a NUL- or space-terminated octal field. Leading padding is
/// skipped and an all-blank field reads as zero, which some writers emit
/// for directory entries.
fn parse_octal(field: &[u8], offset: usize) -> Result<u64> {
    let mut value: u64 = 0;
    let mut seen_digit = false;
    for &byte in field {
        match byte {
            b' ' | 0 if !seen_digit => continue,
            b' ' | 0 => break,
            b'0'..=b'7' => {
                seen_digit = true;
                // Field width caps the value at 12 octal digits, well
                // inside u64 range.
                value = value * 8 + u64::from(byte - b'0');
            }
            _ => {
                return Err(TarError::InvalidSize {
                    offset,
                    found: String::from_utf8_lossy(field)
                        .trim_end_matches(['\0', ' '])
                        .to_string(),
                });
            }
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_octal_standard_field() {
        assert_eq!(parse_octal(b"00000000171\0", 0).unwrap(), 0o171);
    }

    #[test]
    fn parse_octal_space_terminated() {
        assert_eq!(parse_octal(b"00000001750 ", 0).unwrap(), 0o1750);
    }

    #[test]
    fn parse_octal_leading_spaces() {
        assert_eq!(parse_octal(b"     1750 \0\0", 0).unwrap(), 0o1750);
    }

    #[test]
    fn parse_octal_blank_field_is_zero() {
        assert_eq!(parse_octal(&[0u8; 12], 0).unwrap(), 0);
        assert_eq!(parse_octal(b"            ", 0).unwrap(), 0);
    }

    #[test]
    fn parse_octal_rejects_non_octal() {
        let err = parse_octal(b"0000000x111\0", 1024).unwrap_err();
        assert!(matches!(err, TarError::InvalidSize { offset: 1024, .. }));
    }

    #[test]
    fn parse_octal_rejects_digits_eight_and_nine() {
        assert!(parse_octal(b"00000000090\0", 0).is_err());
    }

    #[test]
    fn magic_detection_needs_full_header() {
        let mut data = vec![0u8; BLOCK_SIZE];
        data[MAGIC_OFFSET..MAGIC_OFFSET + 5].copy_from_slice(USTAR_MAGIC);
        assert!(has_ustar_magic(&data));
        assert!(!has_ustar_magic(&data[..262]));
        assert!(!has_ustar_magic(b"ustar"));
    }
}
