//! # Resource Cache
//!
//! The orchestrator tying the pieces together: a request descriptor is
//! rendered into a namespaced key, looked up across the provider chain,
//! and on a miss the upstream archive is fetched, extracted, assembled
//! into one JSON document, validated, and written through every tier.
//! Offline operation falls back to the best stale copy the chain saw.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use rc_archive::{ExtractedFile, extract_all, find_by_suffix};

use crate::cache::{
    CacheItem, CacheKey, CacheValidator, ChainLookup, FileProvider, KvProvider, MemoryProvider,
    ProviderChain, TierStats,
};
use crate::client::create_client;
use crate::config::ResourceCacheConfig;
use crate::error::ResourceError;
use crate::kv::RestKvStore;
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::resource::ResourceDescriptor;
use crate::upstream::UpstreamSource;

/// Where a returned value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceOrigin {
    /// Fresh from a cache tier
    Cache(&'static str),
    /// Fetched from the upstream host on this call
    Upstream,
    /// Expired copy served because upstream could not deliver
    Stale(&'static str),
}

impl std::fmt::Display for ResourceOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceOrigin::Cache(tier) => write!(f, "{tier}"),
            ResourceOrigin::Upstream => write!(f, "upstream"),
            ResourceOrigin::Stale(tier) => write!(f, "stale({tier})"),
        }
    }
}

/// A resolved resource with its provenance.
#[derive(Debug, Clone)]
pub struct ResourceContent {
    pub value: Value,
    pub origin: ResourceOrigin,
}

/// Multi-tier resource cache over an upstream archive host
pub struct ResourceCache {
    chain: ProviderChain,
    validator: CacheValidator,
    monitor: NetworkMonitor,
    upstream: UpstreamSource,
    config: ResourceCacheConfig,
}

impl ResourceCache {
    /// Build the cache: wire the configured tiers, probe the KV store
    /// when one is configured, and share one HTTP client between the
    /// fetcher and the monitor.
    pub async fn new(config: ResourceCacheConfig) -> Result<Self, ResourceError> {
        let client = create_client(&config.upstream)?;

        let mut chain = ProviderChain::new(
            config.cache.data_version.clone(),
            config.cache.warm_ttl_cap,
        );
        chain.register(Arc::new(MemoryProvider::new(config.cache.memory_capacity)));
        if config.cache.file_enabled {
            chain.register(Arc::new(FileProvider::new(config.cache.resolved_cache_dir())));
        }
        if let Some(kv) = &config.cache.kv {
            let store = RestKvStore::new(client.clone(), kv.base_url.clone(), kv.token.clone());
            chain.register(Arc::new(KvProvider::connect(Arc::new(store)).await));
        }

        let probe_url = config
            .monitor
            .probe_url
            .clone()
            .unwrap_or_else(|| config.upstream.base_url.clone());
        let monitor = NetworkMonitor::new(
            client.clone(),
            probe_url,
            config.monitor.refresh_window,
            config.monitor.probe_timeout,
        );
        let upstream = UpstreamSource::new(client, &config.upstream);
        let validator = CacheValidator::new(config.cache.validation);

        info!(
            data_version = %config.cache.data_version,
            tiers = chain.providers().len(),
            upstream = %config.upstream.base_url,
            "resource cache ready"
        );

        Ok(Self {
            chain,
            validator,
            monitor,
            upstream,
            config,
        })
    }

    /// Cache key a descriptor resolves to.
    pub fn key_for(&self, desc: &ResourceDescriptor) -> CacheKey {
        CacheKey::new(
            self.config.cache.data_version.clone(),
            desc.resource.category(),
            desc.identifier(),
        )
    }

    /// Resolve a resource: cache first, upstream on a miss, stale copy
    /// when upstream cannot deliver.
    pub async fn get_resource(
        &self,
        desc: &ResourceDescriptor,
    ) -> Result<ResourceContent, ResourceError> {
        let key = self.key_for(desc);

        let stale = match self.chain.get(&key).await {
            ChainLookup::Hit { item, provider } => {
                return Ok(ResourceContent {
                    value: item.value,
                    origin: ResourceOrigin::Cache(provider),
                });
            }
            ChainLookup::Stale { item, provider } => Some((item, provider)),
            ChainLookup::Miss => None,
        };

        if !self.monitor.is_online().await {
            return match stale {
                Some((item, provider)) => {
                    info!(key = %key, provider, "offline, serving stale copy");
                    Ok(ResourceContent {
                        value: item.value,
                        origin: ResourceOrigin::Stale(provider),
                    })
                }
                None => Err(ResourceError::Unavailable(desc.identifier())),
            };
        }

        let value = match self.fetch_and_assemble(desc).await {
            Ok(value) => value,
            // A 404 is definitive: the resource is absent upstream, a
            // stale copy must not resurrect it.
            Err(e @ ResourceError::NotFound(_)) => return Err(e),
            Err(e) => {
                return match stale {
                    Some((item, provider)) => {
                        warn!(key = %key, provider, error = %e, "upstream failed, serving stale copy");
                        Ok(ResourceContent {
                            value: item.value,
                            origin: ResourceOrigin::Stale(provider),
                        })
                    }
                    None => Err(e),
                };
            }
        };

        let validation = self.validator.validate(&value);
        if validation.cacheable {
            for warning in &validation.warnings {
                warn!(key = %key, warning = %warning, "payload cached with warning");
            }
            let ttl = self.ttl_for(desc);
            let item = CacheItem::new(value.clone(), ttl, self.config.cache.data_version.clone());
            let written = self.chain.set(&key, item).await;
            debug!(key = %key, tiers = written, ttl_secs = ttl.as_secs(), "wrote through cache tiers");
        } else if self.validator.is_strict() {
            return Err(ResourceError::Validation {
                reasons: validation.reasons,
            });
        } else {
            info!(key = %key, reasons = ?validation.reasons, "payload not cacheable, returned uncached");
        }

        Ok(ResourceContent {
            value,
            origin: ResourceOrigin::Upstream,
        })
    }

    /// Remove a resource from every tier.
    pub async fn delete(&self, desc: &ResourceDescriptor) -> Result<(), ResourceError> {
        self.chain.delete(&self.key_for(desc)).await?;
        Ok(())
    }

    /// Empty every tier.
    pub async fn clear(&self) -> Result<(), ResourceError> {
        self.chain.clear().await?;
        Ok(())
    }

    /// Per-tier stats snapshot.
    pub async fn stats(&self) -> Vec<TierStats> {
        self.chain.stats().await
    }

    /// Data version namespacing all keys.
    pub fn data_version(&self) -> &str {
        self.chain.data_version()
    }

    /// Reachability monitor for the upstream host.
    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Connectivity snapshot without probing.
    pub fn network_status(&self) -> NetworkStatus {
        self.monitor.status()
    }

    /// Drain background cache maintenance tasks.
    pub async fn shutdown(&self) {
        self.chain.shutdown().await;
        debug!("resource cache shut down");
    }

    fn ttl_for(&self, desc: &ResourceDescriptor) -> Duration {
        self.config
            .cache
            .ttl
            .for_category(desc.resource.category())
            .min(self.config.cache.max_ttl)
    }

    async fn fetch_and_assemble(&self, desc: &ResourceDescriptor) -> Result<Value, ResourceError> {
        let bytes = self.upstream.fetch_archive(desc).await?;
        let files = extract_all(&bytes, &self.config.cache.extraction)?;
        debug!(resource = %desc, files = files.len(), "archive extracted");
        Ok(assemble_content(desc, &files))
    }
}

/// Assemble extracted files into the logical resource document.
fn assemble_content(desc: &ResourceDescriptor, files: &[ExtractedFile]) -> Value {
    let manifest = find_by_suffix(files, "manifest.yaml").map(|f| f.content.clone());
    json!({
        "language": desc.language,
        "organization": desc.organization,
        "resource": desc.resource.slug(),
        "ref": desc.resolved_ref(),
        "totalCount": files.len(),
        "items": files,
        "manifest": manifest,
    })
}
