use anyhow::{Context, Result, bail};
use scrio_engine::{ArchiveFlavor, DEFAULT_UPSTREAM_URL, ResourceCacheConfig, ValidationMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file picked up from the working directory when no
/// `--config` flag is given.
const DEFAULT_CONFIG_FILE: &str = "scrio.toml";

/// Application configuration, merged from a TOML file and CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Upstream git host serving resource archives
    pub upstream_url: String,

    /// Archive container to request: "zip" or "tar.gz"
    pub archive_flavor: String,

    /// Cache key namespace; bump it to invalidate every tier at once
    pub data_version: String,

    /// File tier directory, system temp directory when absent
    pub cache_dir: Option<PathBuf>,

    /// Memory tier capacity in entries
    pub memory_capacity: u64,

    /// Disable the file tier entirely
    pub no_file_cache: bool,

    /// Remote KV namespace URL; the tier is skipped when absent
    pub kv_url: Option<String>,

    /// Bearer token for the KV namespace
    pub kv_token: Option<String>,

    /// Fail fetches on uncacheable payloads instead of skipping the write
    pub strict_validation: bool,

    /// Whole-request timeout in seconds, 0 to disable
    pub timeout_secs: u64,

    /// Connection timeout in seconds, 0 to disable
    pub connect_timeout_secs: u64,

    /// How long a reachability verdict stays cached, in seconds
    pub refresh_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            archive_flavor: "zip".to_string(),
            data_version: "1".to_string(),
            cache_dir: None,
            memory_capacity: 1024,
            no_file_cache: false,
            kv_url: None,
            kv_token: None,
            strict_validation: false,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            refresh_window_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the given path, from `scrio.toml` in the
    /// working directory, or fall back to built-in defaults.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                let content = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read configuration file: {}", path.display())
                })?;
                toml::from_str(&content).context("Failed to parse configuration file")
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(Some(default_path))
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Convert into the engine configuration.
    pub fn to_engine_config(&self) -> Result<ResourceCacheConfig> {
        let upstream = self
            .upstream_url
            .parse()
            .with_context(|| format!("Invalid upstream URL: {}", self.upstream_url))?;
        let flavor = match self.archive_flavor.as_str() {
            "zip" => ArchiveFlavor::Zip,
            "tar.gz" | "targz" | "tgz" => ArchiveFlavor::TarGz,
            other => bail!("Unknown archive flavor: {other} (expected \"zip\" or \"tar.gz\")"),
        };

        let mut builder = ResourceCacheConfig::builder()
            .upstream_url(upstream)
            .archive_flavor(flavor)
            .data_version(self.data_version.as_str())
            .memory_capacity(self.memory_capacity)
            .file_cache(!self.no_file_cache)
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .refresh_window(Duration::from_secs(self.refresh_window_secs));

        if let Some(dir) = &self.cache_dir {
            builder = builder.cache_dir(dir);
        }
        if let Some(kv_url) = &self.kv_url {
            let base = kv_url
                .parse()
                .with_context(|| format!("Invalid KV URL: {kv_url}"))?;
            builder = builder.kv_store(base, self.kv_token.clone());
        }
        if self.strict_validation {
            builder = builder.validation(ValidationMode::Strict);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.data_version, "1");
        assert!(!config.strict_validation);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "upstream_url = \"https://mirror.example.com\"").unwrap();
        writeln!(file, "strict_validation = true").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.upstream_url, "https://mirror.example.com");
        assert!(config.strict_validation);
        assert_eq!(config.memory_capacity, 1024);
    }

    #[test]
    fn engine_config_carries_kv_and_flavor() {
        let app = AppConfig {
            archive_flavor: "tar.gz".to_string(),
            kv_url: Some("https://kv.example.com/v1/ns".to_string()),
            kv_token: Some("secret".to_string()),
            strict_validation: true,
            ..AppConfig::default()
        };

        let engine = app.to_engine_config().unwrap();
        assert_eq!(engine.upstream.archive_flavor, ArchiveFlavor::TarGz);
        assert_eq!(engine.cache.validation, ValidationMode::Strict);
        let kv = engine.cache.kv.expect("kv config should be present");
        assert_eq!(kv.base_url.as_str(), "https://kv.example.com/v1/ns");
        assert_eq!(kv.token.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_flavor_is_rejected() {
        let app = AppConfig {
            archive_flavor: "rar".to_string(),
            ..AppConfig::default()
        };
        assert!(app.to_engine_config().is_err());
    }
}
