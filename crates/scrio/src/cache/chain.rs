//! # Provider Chain
//!
//! Walks the cache tiers by descending priority. A fresh hit warms
//! every faster tier that missed; a stale entry is kept in hand as a
//! fallback for offline operation while its eviction proceeds in the
//! background. Tier failures are contained: a broken provider logs and
//! counts as a miss, it never fails the lookup.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::cache::providers::provider::CacheProvider;
use crate::cache::types::{CacheItem, CacheKey, CacheResult, ItemState};

/// Outcome of a chain lookup.
#[derive(Debug, Clone)]
pub enum ChainLookup {
    /// A fresh item, with the name of the tier that served it
    Hit {
        item: CacheItem,
        provider: &'static str,
    },
    /// Best stale item found while walking; usable as an offline fallback
    Stale {
        item: CacheItem,
        provider: &'static str,
    },
    /// No tier holds the key
    Miss,
}

/// Point-in-time view of one tier, for stats reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TierStats {
    pub name: &'static str,
    pub priority: u8,
    pub available: bool,
    /// Entry count, `None` when the tier failed to report
    pub items: Option<u64>,
}

/// Ordered collection of cache tiers
pub struct ProviderChain {
    providers: Vec<Arc<dyn CacheProvider>>,
    data_version: String,
    warm_ttl_cap: Duration,
    tasks: TaskTracker,
}

impl ProviderChain {
    pub fn new(data_version: impl Into<String>, warm_ttl_cap: Duration) -> Self {
        Self {
            providers: Vec::new(),
            data_version: data_version.into(),
            warm_ttl_cap,
            tasks: TaskTracker::new(),
        }
    }

    /// Add a tier. Registration order does not matter; the chain keeps
    /// itself sorted by descending priority.
    pub fn register(&mut self, provider: Arc<dyn CacheProvider>) {
        debug!(
            provider = provider.name(),
            priority = provider.priority(),
            "cache tier registered"
        );
        self.providers.push(provider);
        self.providers.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn providers(&self) -> &[Arc<dyn CacheProvider>] {
        &self.providers
    }

    pub fn data_version(&self) -> &str {
        &self.data_version
    }

    /// Walk the tiers for a key.
    ///
    /// Stale entries met along the way are evicted in the background and
    /// the first one is reported for fallback use. The lookup itself
    /// never errors.
    pub async fn get(&self, key: &CacheKey) -> ChainLookup {
        let mut stale: Option<(CacheItem, &'static str)> = None;
        let mut missed: Vec<Arc<dyn CacheProvider>> = Vec::new();

        for provider in &self.providers {
            if !provider.is_available().await {
                debug!(provider = provider.name(), "skipping unavailable tier");
                continue;
            }

            match provider.peek(key).await {
                Ok(Some(item)) => match item.state(&self.data_version) {
                    ItemState::Fresh => {
                        debug!(key = %key, provider = provider.name(), "cache hit");
                        self.warm(key, &item, &missed);
                        return ChainLookup::Hit {
                            item,
                            provider: provider.name(),
                        };
                    }
                    state => {
                        debug!(key = %key, provider = provider.name(), ?state, "stale entry found");
                        self.evict_in_background(provider.clone(), key.clone());
                        if stale.is_none() {
                            stale = Some((item, provider.name()));
                        }
                        missed.push(provider.clone());
                    }
                },
                Ok(None) => missed.push(provider.clone()),
                Err(e) => {
                    warn!(key = %key, provider = provider.name(), error = %e, "tier read failed");
                    missed.push(provider.clone());
                }
            }
        }

        match stale {
            Some((item, provider)) => ChainLookup::Stale { item, provider },
            None => ChainLookup::Miss,
        }
    }

    /// Write an item to every available tier. Per-tier failures are
    /// logged and skipped. Returns the number of tiers written.
    pub async fn set(&self, key: &CacheKey, item: CacheItem) -> usize {
        let mut written = 0;
        for provider in &self.providers {
            if !provider.is_available().await {
                continue;
            }
            match provider.set(key, item.clone()).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(key = %key, provider = provider.name(), error = %e, "tier write failed");
                }
            }
        }
        written
    }

    /// Remove a key from every tier, reporting the first failure after
    /// attempting all of them.
    pub async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let mut first_err = None;
        for provider in &self.providers {
            if !provider.is_available().await {
                continue;
            }
            if let Err(e) = provider.delete(key).await {
                warn!(key = %key, provider = provider.name(), error = %e, "tier delete failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Empty every tier, reporting the first failure after attempting
    /// all of them.
    pub async fn clear(&self) -> CacheResult<()> {
        let mut first_err = None;
        for provider in &self.providers {
            if !provider.is_available().await {
                continue;
            }
            if let Err(e) = provider.clear().await {
                warn!(provider = provider.name(), error = %e, "tier clear failed");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub async fn stats(&self) -> Vec<TierStats> {
        let mut stats = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let available = provider.is_available().await;
            let items = match provider.item_count().await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "tier count failed");
                    None
                }
            };
            stats.push(TierStats {
                name: provider.name(),
                priority: provider.priority(),
                available,
                items,
            });
        }
        stats
    }

    /// Wait for background warms and evictions to finish.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn evict_in_background(&self, provider: Arc<dyn CacheProvider>, key: CacheKey) {
        self.tasks.spawn(async move {
            if let Err(e) = provider.delete(&key).await {
                warn!(key = %key, provider = provider.name(), error = %e, "stale eviction failed");
            }
        });
    }

    /// Propagate a hit to the faster tiers that missed it.
    ///
    /// The copy's TTL is capped so a propagated entry re-validates
    /// against the slower tier well before the original expires, and
    /// the write is dropped if the data version moved in the meantime.
    fn warm(&self, key: &CacheKey, item: &CacheItem, targets: &[Arc<dyn CacheProvider>]) {
        if targets.is_empty() {
            return;
        }

        let warmed = item.warmed(self.warm_ttl_cap);
        let key = key.clone();
        let version = self.data_version.clone();
        let targets = targets.to_vec();

        self.tasks.spawn(async move {
            if warmed.version != version {
                debug!(key = %key, "skipping warm, data version changed");
                return;
            }
            for provider in targets {
                match provider.set(&key, warmed.clone()).await {
                    Ok(()) => debug!(key = %key, provider = provider.name(), "tier warmed"),
                    Err(e) => {
                        warn!(key = %key, provider = provider.name(), error = %e, "tier warm failed");
                    }
                }
            }
        });
    }
}
