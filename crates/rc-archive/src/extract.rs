use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use serde::Serialize;
use tracing::{debug, warn};
use ustar::TarArchive;

use crate::format::{ArchiveType, detect_archive_type};
use crate::{ArchiveError, Result};

/// A text file recovered from an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFile {
    /// Entry path exactly as stored in the archive.
    pub path: String,
    /// File content decoded as UTF-8.
    pub content: String,
    /// Content length in bytes.
    pub size: usize,
}

impl ExtractedFile {
    fn new(path: String, content: String) -> Self {
        let size = content.len();
        Self {
            path,
            content,
            size,
        }
    }
}

/// Caps applied while unpacking untrusted archives.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    /// Maximum number of emitted files.
    pub max_files: usize,
    /// Maximum total content bytes across all emitted files.
    pub max_total_bytes: u64,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_files: 10_000,
            max_total_bytes: 256 * 1024 * 1024,
        }
    }
}

struct Budget {
    limits: ExtractionLimits,
    files: usize,
    bytes: u64,
}

impl Budget {
    fn new(limits: ExtractionLimits) -> Self {
        Self {
            limits,
            files: 0,
            bytes: 0,
        }
    }

    /// Charges one file of `size` bytes against the limits. Called before
    /// the payload is materialized so an oversized entry never allocates.
    fn charge(&mut self, size: u64) -> Result<()> {
        self.files += 1;
        if self.files > self.limits.max_files {
            return Err(ArchiveError::TooManyFiles {
                files: self.files,
                max_files: self.limits.max_files,
            });
        }
        self.bytes += size;
        if self.bytes > self.limits.max_total_bytes {
            return Err(ArchiveError::TooManyBytes {
                bytes: self.bytes,
                max_bytes: self.limits.max_total_bytes,
            });
        }
        Ok(())
    }

    /// Returns a charge for an entry that ended up skipped, so the limits
    /// track emitted content only.
    fn refund(&mut self, size: u64) {
        self.files -= 1;
        self.bytes -= size;
    }
}

/// Unpacks `data` into memory, sniffing the format from magic bytes.
///
/// Unknown formats yield an empty list rather than an error; the magic
/// bytes are logged for diagnosis. Directory entries, macOS resource forks
/// (`__MACOSX`), hidden dot-files and empty files are dropped, and entries
/// whose name or content is not valid UTF-8 are skipped with a warning.
/// Corrupt tar data mid-archive stops the walk and returns what was
/// extracted up to that point.
pub fn extract_all(data: &[u8], limits: &ExtractionLimits) -> Result<Vec<ExtractedFile>> {
    let archive_type = detect_archive_type(data);
    debug!(%archive_type, bytes = data.len(), "extracting archive");
    let files = match archive_type {
        ArchiveType::Zip => extract_zip(data, limits)?,
        ArchiveType::Gzip => extract_tar_gz(data, limits)?,
        ArchiveType::Tar => extract_tar(data, limits)?,
        ArchiveType::Unknown => {
            let leading: Vec<u8> = data.iter().take(4).copied().collect();
            warn!(
                leading = ?leading,
                bytes = data.len(),
                "unrecognized archive format, nothing extracted"
            );
            Vec::new()
        }
    };
    debug!(%archive_type, files = files.len(), "archive extracted");
    Ok(files)
}

fn extract_zip(data: &[u8], limits: &ExtractionLimits) -> Result<Vec<ExtractedFile>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut budget = Budget::new(*limits);
    let mut files = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() || entry.size() == 0 {
            continue;
        }
        let path = entry.name().to_string();
        if is_filtered(&path) {
            continue;
        }
        let declared = entry.size();
        budget.charge(declared)?;
        let mut payload = Vec::with_capacity(declared as usize);
        entry.read_to_end(&mut payload)?;
        match String::from_utf8(payload) {
            Ok(content) => files.push(ExtractedFile::new(path, content)),
            Err(_) => {
                warn!(path = %path, "skipping entry with non-UTF-8 content");
                budget.refund(declared);
            }
        }
    }

    Ok(files)
}

fn extract_tar_gz(data: &[u8], limits: &ExtractionLimits) -> Result<Vec<ExtractedFile>> {
    // Bound the decompressed stream before parsing it. Tar framing adds at
    // most a kibibyte per entry on top of the content budget, so anything
    // past this cap is a bomb, not a resource archive.
    let cap = limits.max_total_bytes + (limits.max_files as u64 + 1) * 1024;
    let mut decoder = GzDecoder::new(data).take(cap + 1);
    let mut tar_bytes = Vec::new();
    decoder
        .read_to_end(&mut tar_bytes)
        .map_err(ArchiveError::Gzip)?;
    if tar_bytes.len() as u64 > cap {
        return Err(ArchiveError::TooManyBytes {
            bytes: tar_bytes.len() as u64,
            max_bytes: cap,
        });
    }
    extract_tar(&tar_bytes, limits)
}

fn extract_tar(data: &[u8], limits: &ExtractionLimits) -> Result<Vec<ExtractedFile>> {
    let mut budget = Budget::new(*limits);
    let mut files = Vec::new();

    for entry in TarArchive::new(data).entries() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                // A corrupt trailer should not cost the files already read.
                warn!(error = %e, extracted = files.len(), "tar walk stopped early");
                break;
            }
        };
        if !entry.is_regular_file() || entry.size() == 0 {
            continue;
        }
        let Some(path) = entry.name() else {
            warn!(name = ?entry.name_bytes(), "skipping entry with non-UTF-8 name");
            continue;
        };
        if path.is_empty() || is_filtered(path) {
            continue;
        }
        let Ok(content) = std::str::from_utf8(entry.data()) else {
            warn!(path = %path, "skipping entry with non-UTF-8 content");
            continue;
        };
        budget.charge(entry.size() as u64)?;
        files.push(ExtractedFile::new(path.to_string(), content.to_string()));
    }

    Ok(files)
}

/// Archive bookkeeping entries that never count as content: directory
/// markers, anything under `__MACOSX`, and hidden files whose base name
/// starts with a dot.
pub fn is_filtered(path: &str) -> bool {
    if path.ends_with('/') {
        return true;
    }
    if path.split('/').any(|component| component == "__MACOSX") {
        return true;
    }
    let base = path.rsplit('/').next().unwrap_or(path);
    base.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_zip(entries: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for dir in dirs {
            writer.add_directory(*dir, options).unwrap();
        }
        for (path, content) in entries {
            writer.start_file(*path, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn build_tar(entries: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for dir in dirs {
            let mut header = tar::Header::new_ustar();
            header.set_entry_type(tar::EntryType::dir());
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, *dir, &[][..]).unwrap();
        }
        for (path, content) in entries {
            let mut header = tar::Header::new_ustar();
            header.set_entry_type(tar::EntryType::file());
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, *path, *content).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn build_tar_gz(entries: &[(&str, &[u8])], dirs: &[&str]) -> Vec<u8> {
        gzip(&build_tar(entries, dirs))
    }

    #[test]
    fn extracts_single_file_zip() {
        let data = build_zip(&[("a.txt", b"hi")], &[]);
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "a.txt");
        assert_eq!(files[0].content, "hi");
        assert_eq!(files[0].size, 2);
    }

    #[test]
    fn zip_filters_bookkeeping_entries() {
        let data = build_zip(
            &[
                ("en_tw/manifest.yaml", b"dublin_core: {}"),
                ("en_tw/bible/kt/grace.md", b"# grace"),
                ("__MACOSX/en_tw/._manifest.yaml", b"junk"),
                ("en_tw/.gitattributes", b"* text=auto"),
            ],
            &["en_tw/", "en_tw/bible/"],
        );

        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["en_tw/manifest.yaml", "en_tw/bible/kt/grace.md"]);
        assert_eq!(files[1].content, "# grace");
    }

    #[test]
    fn tar_gz_excludes_directories() {
        let data = build_tar_gz(&[("b/c.txt", b"x")], &["b/"]);
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "b/c.txt");
        assert_eq!(files[0].content, "x");
    }

    #[test]
    fn bare_tar_round_trip() {
        let data = build_tar(&[("notes/tn_GEN.tsv", b"Reference\tID\n1:1\tabcd\n")], &[]);
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].content, "Reference\tID\n1:1\tabcd\n");
    }

    #[test]
    fn empty_files_are_dropped() {
        let zip = build_zip(&[("a.txt", b""), ("b.txt", b"x")], &[]);
        let files = extract_all(&zip, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "b.txt");

        let tar = build_tar(&[("a.txt", b""), ("b.txt", b"x")], &[]);
        let files = extract_all(&tar, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn empty_archive_extracts_to_empty_list() {
        let data = build_tar_gz(&[], &["en_tn/"]);
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn unknown_format_yields_empty_list() {
        let files = extract_all(b"not an archive at all", &ExtractionLimits::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn corrupted_gzip_fails_without_panicking() {
        let mut data = build_tar_gz(&[("file.txt", &[b'a'; 8192])], &[]);
        let mid = data.len() / 2;
        for byte in &mut data[mid..mid + 16] {
            *byte ^= 0xFF;
        }
        assert!(extract_all(&data, &ExtractionLimits::default()).is_err());
    }

    #[test]
    fn corrupt_tar_trailer_returns_partial_results() {
        let mut data = build_tar(
            &[("kept.txt", b"kept"), ("lost.txt", b"lost")],
            &[],
        );
        // Wreck the second header's size field with non-octal bytes.
        data[512 + 512 + 124..512 + 512 + 130].copy_from_slice(b"xxxxxx");

        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.txt");
    }

    #[test]
    fn file_count_limit_is_enforced() {
        let data = build_zip(&[("a", b"1"), ("b", b"2"), ("c", b"3")], &[]);
        let limits = ExtractionLimits {
            max_files: 2,
            ..Default::default()
        };
        assert!(matches!(
            extract_all(&data, &limits),
            Err(ArchiveError::TooManyFiles {
                files: 3,
                max_files: 2
            })
        ));
    }

    #[test]
    fn byte_limit_is_enforced_for_zip() {
        let data = build_zip(&[("big.txt", &[b'x'; 4096])], &[]);
        let limits = ExtractionLimits {
            max_total_bytes: 1024,
            ..Default::default()
        };
        assert!(matches!(
            extract_all(&data, &limits),
            Err(ArchiveError::TooManyBytes { .. })
        ));
    }

    #[test]
    fn byte_limit_is_enforced_for_tar_gz() {
        let data = build_tar_gz(&[("big.txt", &[b'x'; 8192])], &[]);
        let limits = ExtractionLimits {
            max_total_bytes: 1024,
            ..Default::default()
        };
        assert!(matches!(
            extract_all(&data, &limits),
            Err(ArchiveError::TooManyBytes { .. })
        ));
    }

    #[test]
    fn filter_rules() {
        assert!(is_filtered("dir/"));
        assert!(is_filtered("__MACOSX/file.txt"));
        assert!(is_filtered("repo/__MACOSX/._file"));
        assert!(is_filtered(".DS_Store"));
        assert!(is_filtered("repo/.gitignore"));
        assert!(!is_filtered("repo/manifest.yaml"));
        assert!(!is_filtered("repo/bible.names/intro.md"));
        assert!(!is_filtered("./repo/intro.md"));
    }

    #[test]
    fn non_utf8_content_is_skipped() {
        let data = build_zip(
            &[("binary.bin", &[0xFF, 0xFE, 0x00, 0x01]), ("text.md", b"ok")],
            &[],
        );
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "text.md");

        let data = build_tar(
            &[("binary.bin", &[0xFF, 0xFE, 0x00, 0x01]), ("text.md", b"ok")],
            &[],
        );
        let files = extract_all(&data, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "text.md");
    }

    #[test]
    fn non_utf8_tar_names_are_skipped() {
        let mut archive = vec![0u8; 512];
        archive[..2].copy_from_slice(&[0xFF, 0xFE]);
        archive[124..136].copy_from_slice(b"00000000001\0");
        archive[156] = b'0';
        archive[257..262].copy_from_slice(b"ustar");
        archive.extend_from_slice(b"x");
        archive.resize(512 + 512, 0);
        // An entry with a clean name afterwards still comes through.
        let rest = build_tar(&[("kept.txt", b"ok")], &[]);
        archive.extend_from_slice(&rest);

        let files = extract_all(&archive, &ExtractionLimits::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.txt");
    }
}
