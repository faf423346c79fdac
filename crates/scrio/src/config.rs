//! # Engine Configuration
//!
//! Settings for the cache tiers, the upstream host, and the network
//! monitor, with a builder for assembling them fluently.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use rc_archive::ExtractionLimits;

use crate::cache::ValidationMode;
use crate::resource::ResourceCategory;
use crate::upstream::ArchiveFlavor;

/// Host serving resource repositories when none is configured.
pub const DEFAULT_UPSTREAM_URL: &str = "https://git.door43.org";

const DEFAULT_USER_AGENT: &str = concat!("scrio/", env!("CARGO_PKG_VERSION"));

/// Entry lifetime per cache category.
///
/// Content categories can afford hours; the catalog mirrors a listing
/// endpoint that changes often and expires in minutes.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    pub scripture: Duration,
    pub notes: Duration,
    pub questions: Duration,
    pub words: Duration,
    pub academy: Duration,
    pub catalog: Duration,
}

impl TtlPolicy {
    pub fn for_category(&self, category: ResourceCategory) -> Duration {
        match category {
            ResourceCategory::Scripture => self.scripture,
            ResourceCategory::Notes => self.notes,
            ResourceCategory::Questions => self.questions,
            ResourceCategory::Words => self.words,
            ResourceCategory::Academy => self.academy,
            ResourceCategory::Catalog => self.catalog,
        }
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            scripture: Duration::from_secs(6 * 60 * 60),
            notes: Duration::from_secs(60 * 60),
            questions: Duration::from_secs(60 * 60),
            words: Duration::from_secs(60 * 60),
            academy: Duration::from_secs(6 * 60 * 60),
            catalog: Duration::from_secs(5 * 60),
        }
    }
}

/// Remote KV namespace coordinates.
#[derive(Debug, Clone)]
pub struct KvConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

/// Cache-side settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Data version namespace; bumping it invalidates every entry
    pub data_version: String,
    /// File tier root, `None` for a directory under the system temp dir
    pub cache_dir: Option<PathBuf>,
    /// Memory tier capacity in entries
    pub memory_capacity: u64,
    /// Whether the file tier is wired at all
    pub file_enabled: bool,
    /// Remote KV tier, absent unless configured
    pub kv: Option<KvConfig>,
    /// Per-category entry lifetimes
    pub ttl: TtlPolicy,
    /// Hard upper bound applied over every category TTL
    pub max_ttl: Duration,
    /// Expiry cap for entries copied into faster tiers on a hit
    pub warm_ttl_cap: Duration,
    /// How validation rejections are surfaced
    pub validation: ValidationMode,
    /// Caps applied while unpacking fetched archives
    pub extraction: ExtractionLimits,
}

impl CacheConfig {
    /// Directory backing the file tier.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("scrio-cache"))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_version: "1".to_string(),
            cache_dir: None,
            memory_capacity: 1024,
            file_enabled: true,
            kv: None,
            ttl: TtlPolicy::default(),
            max_ttl: Duration::from_secs(24 * 60 * 60),
            warm_ttl_cap: Duration::from_secs(5 * 60),
            validation: ValidationMode::default(),
            extraction: ExtractionLimits::default(),
        }
    }
}

/// Upstream host settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: Url,
    pub archive_flavor: ArchiveFlavor,
    pub user_agent: String,
    /// Whole-request timeout, zero to disable
    pub timeout: Duration,
    /// Connection timeout, zero to disable
    pub connect_timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_UPSTREAM_URL).expect("default upstream URL is valid"),
            archive_flavor: ArchiveFlavor::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Reachability monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Probe target, `None` to probe the upstream base URL
    pub probe_url: Option<Url>,
    /// How long a probe verdict is reused
    pub refresh_window: Duration,
    /// Per-probe timeout
    pub probe_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_url: None,
            refresh_window: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default)]
pub struct ResourceCacheConfig {
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub monitor: MonitorConfig,
}

impl ResourceCacheConfig {
    pub fn builder() -> ResourceCacheConfigBuilder {
        ResourceCacheConfigBuilder::new()
    }
}

/// Builder for [`ResourceCacheConfig`]
#[derive(Debug, Clone, Default)]
pub struct ResourceCacheConfigBuilder {
    config: ResourceCacheConfig,
}

impl ResourceCacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResourceCacheConfig::default(),
        }
    }

    pub fn data_version(mut self, version: impl Into<String>) -> Self {
        self.config.cache.data_version = version.into();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.cache_dir = Some(dir.into());
        self
    }

    pub fn memory_capacity(mut self, entries: u64) -> Self {
        self.config.cache.memory_capacity = entries;
        self
    }

    pub fn file_cache(mut self, enabled: bool) -> Self {
        self.config.cache.file_enabled = enabled;
        self
    }

    pub fn kv_store(mut self, base_url: Url, token: Option<String>) -> Self {
        self.config.cache.kv = Some(KvConfig { base_url, token });
        self
    }

    pub fn ttl(mut self, ttl: TtlPolicy) -> Self {
        self.config.cache.ttl = ttl;
        self
    }

    pub fn max_ttl(mut self, max_ttl: Duration) -> Self {
        self.config.cache.max_ttl = max_ttl;
        self
    }

    pub fn warm_ttl_cap(mut self, cap: Duration) -> Self {
        self.config.cache.warm_ttl_cap = cap;
        self
    }

    pub fn validation(mut self, mode: ValidationMode) -> Self {
        self.config.cache.validation = mode;
        self
    }

    pub fn extraction_limits(mut self, limits: ExtractionLimits) -> Self {
        self.config.cache.extraction = limits;
        self
    }

    pub fn upstream_url(mut self, base_url: Url) -> Self {
        self.config.upstream.base_url = base_url;
        self
    }

    pub fn archive_flavor(mut self, flavor: ArchiveFlavor) -> Self {
        self.config.upstream.archive_flavor = flavor;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.upstream.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.upstream.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.upstream.connect_timeout = timeout;
        self
    }

    pub fn probe_url(mut self, url: Url) -> Self {
        self.config.monitor.probe_url = Some(url);
        self
    }

    pub fn refresh_window(mut self, window: Duration) -> Self {
        self.config.monitor.refresh_window = window;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.monitor.probe_timeout = timeout;
        self
    }

    pub fn build(self) -> ResourceCacheConfig {
        self.config
    }
}
