use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use crate::extract::ExtractedFile;

/// Strips the `./` prefix some archive writers put on entry paths.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// All entry paths, in archive order.
pub fn list_paths(files: &[ExtractedFile]) -> Vec<&str> {
    files.iter().map(|f| normalize_path(&f.path)).collect()
}

/// Finds a file by exact path, ignoring a leading `./` on either side.
pub fn find_file<'a>(files: &'a [ExtractedFile], path: &str) -> Option<&'a ExtractedFile> {
    let want = normalize_path(path);
    files.iter().find(|f| normalize_path(&f.path) == want)
}

/// Finds the first file whose path ends with `suffix`, matched at a path
/// component boundary. Repository archives nest content under a top-level
/// directory whose exact name varies with the ref, so callers locate files
/// like `manifest.yaml` by suffix rather than full path.
pub fn find_by_suffix<'a>(files: &'a [ExtractedFile], suffix: &str) -> Option<&'a ExtractedFile> {
    let suffix = normalize_path(suffix);
    files.iter().find(|f| {
        let path = normalize_path(&f.path);
        path == suffix
            || path
                .strip_suffix(suffix)
                .is_some_and(|prefix| prefix.ends_with('/'))
    })
}

/// Files whose normalized path matches `pattern`.
pub fn filter_matching<'a>(files: &'a [ExtractedFile], pattern: &Regex) -> Vec<&'a ExtractedFile> {
    files
        .iter()
        .filter(|f| pattern.is_match(normalize_path(&f.path)))
        .collect()
}

/// Aggregate statistics over an extracted file set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub files: usize,
    pub total_bytes: u64,
    /// File count per lowercased extension; extension-less files land
    /// under `(none)`.
    pub by_extension: BTreeMap<String, usize>,
}

/// Counts files and bytes and builds an extension histogram.
pub fn summarize(files: &[ExtractedFile]) -> ArchiveSummary {
    let mut by_extension: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_bytes = 0u64;

    for file in files {
        total_bytes += file.size as u64;
        let base = file.path.rsplit('/').next().unwrap_or(&file.path);
        let ext = match base.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => "(none)".to_string(),
        };
        *by_extension.entry(ext).or_default() += 1;
    }

    ArchiveSummary {
        files: files.len(),
        total_bytes,
        by_extension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> ExtractedFile {
        ExtractedFile {
            path: path.to_string(),
            content: content.to_string(),
            size: content.len(),
        }
    }

    fn fixture() -> Vec<ExtractedFile> {
        vec![
            file("./en_ta/manifest.yaml", "dublin_core: {}"),
            file("en_ta/translate/figs-metaphor/01.md", "A metaphor is"),
            file("en_ta/translate/toc.yaml", "sections: []"),
            file("en_ta/LICENSE", "CC BY-SA 4.0"),
        ]
    }

    #[test]
    fn list_paths_normalizes() {
        let files = fixture();
        assert_eq!(
            list_paths(&files),
            vec![
                "en_ta/manifest.yaml",
                "en_ta/translate/figs-metaphor/01.md",
                "en_ta/translate/toc.yaml",
                "en_ta/LICENSE",
            ]
        );
    }

    #[test]
    fn find_file_ignores_dot_slash() {
        let files = fixture();
        assert!(find_file(&files, "en_ta/manifest.yaml").is_some());
        assert!(find_file(&files, "./en_ta/manifest.yaml").is_some());
        assert!(find_file(&files, "en_ta/missing.yaml").is_none());
    }

    #[test]
    fn find_by_suffix_respects_component_boundaries() {
        let files = fixture();
        let hit = find_by_suffix(&files, "manifest.yaml").unwrap();
        assert_eq!(normalize_path(&hit.path), "en_ta/manifest.yaml");

        // "c.yaml" is a suffix of "toc.yaml" as a string but not as a path.
        assert!(find_by_suffix(&files, "c.yaml").is_none());
        assert!(find_by_suffix(&files, "toc.yaml").is_some());
        assert!(find_by_suffix(&files, "figs-metaphor/01.md").is_some());
    }

    #[test]
    fn filter_matching_uses_normalized_paths() {
        let files = fixture();
        let pattern = Regex::new(r"^en_ta/translate/.*\.md$").unwrap();
        let hits = filter_matching(&files, &pattern);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "en_ta/translate/figs-metaphor/01.md");

        let yaml = Regex::new(r"\.yaml$").unwrap();
        assert_eq!(filter_matching(&files, &yaml).len(), 2);
    }

    #[test]
    fn summarize_counts_and_buckets() {
        let files = fixture();
        let summary = summarize(&files);
        assert_eq!(summary.files, 4);
        assert_eq!(
            summary.total_bytes,
            files.iter().map(|f| f.size as u64).sum::<u64>()
        );
        assert_eq!(summary.by_extension.get("yaml"), Some(&2));
        assert_eq!(summary.by_extension.get("md"), Some(&1));
        assert_eq!(summary.by_extension.get("(none)"), Some(&1));
    }

    #[test]
    fn summarize_treats_dotfiles_as_extensionless() {
        // A lone leading dot is a hidden-file marker, not an extension.
        let files = vec![file("x/.profile", "data")];
        let summary = summarize(&files);
        assert_eq!(summary.by_extension.get("(none)"), Some(&1));
    }
}
