use std::fmt;

/// Container formats recognized by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// PK zip container.
    Zip,
    /// Gzip stream, assumed to wrap a tar archive.
    Gzip,
    /// Bare POSIX ustar archive.
    Tar,
    /// No supported magic found.
    Unknown,
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveType::Zip => write!(f, "zip"),
            ArchiveType::Gzip => write!(f, "gzip"),
            ArchiveType::Tar => write!(f, "tar"),
            ArchiveType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Sniffs the container format from leading magic bytes.
///
/// Checked in order: zip (`PK`), gzip (`1F 8B`), then the ustar magic at
/// byte 257. File extensions are never consulted; git hosts serve archives
/// under misleading names often enough that content wins.
pub fn detect_archive_type(data: &[u8]) -> ArchiveType {
    if data.len() >= 2 && data[0] == 0x50 && data[1] == 0x4B {
        return ArchiveType::Zip;
    }
    if data.len() >= 2 && data[0] == 0x1F && data[1] == 0x8B {
        return ArchiveType::Gzip;
    }
    if ustar::has_ustar_magic(data) {
        return ArchiveType::Tar;
    }
    ArchiveType::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_zip_magic() {
        assert_eq!(detect_archive_type(&[0x50, 0x4B, 0x03, 0x04]), ArchiveType::Zip);
        // Empty zips start with the end-of-central-directory record, still PK.
        assert_eq!(detect_archive_type(&[0x50, 0x4B, 0x05, 0x06]), ArchiveType::Zip);
    }

    #[test]
    fn detects_gzip_magic() {
        assert_eq!(detect_archive_type(&[0x1F, 0x8B, 0x08, 0x00]), ArchiveType::Gzip);
    }

    #[test]
    fn detects_bare_tar_magic() {
        let mut data = vec![0u8; 512];
        data[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect_archive_type(&data), ArchiveType::Tar);
    }

    #[test]
    fn tar_magic_needs_a_full_header() {
        // Short buffers cannot reach past offset 262, so they stay unknown
        // even when the bytes before the cut would have matched.
        let mut data = vec![0u8; 262];
        data[257..262].copy_from_slice(b"ustar");
        assert_eq!(detect_archive_type(&data), ArchiveType::Unknown);
    }

    #[test]
    fn unrecognized_content_is_unknown() {
        assert_eq!(detect_archive_type(b"%PDF-1.7 ..."), ArchiveType::Unknown);
        assert_eq!(detect_archive_type(b"{\"json\": true}"), ArchiveType::Unknown);
        assert_eq!(detect_archive_type(&[]), ArchiveType::Unknown);
        assert_eq!(detect_archive_type(&[0x50]), ArchiveType::Unknown);
    }
}
