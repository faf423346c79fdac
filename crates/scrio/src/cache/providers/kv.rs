//! # KV Cache Provider
//!
//! Distributed tier between the local filesystem and upstream. Entries
//! are shared across instances, so a fetch done by one node saves the
//! next node the trip upstream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::providers::provider::CacheProvider;
use crate::cache::types::{CacheItem, CacheKey, CacheResult};
use crate::kv::{KvStore, NullKvStore};

/// Shortest store-side expiration remote namespaces accept.
const MIN_STORE_TTL: Duration = Duration::from_secs(60);

/// Cache tier backed by a [`KvStore`]
pub struct KvProvider {
    store: Arc<dyn KvStore>,
    available: bool,
}

impl KvProvider {
    /// Chain rank of the KV tier.
    pub const PRIORITY: u8 = 50;

    const PROBE_KEY: &'static str = "availability-probe";

    /// Probe the store once and wire the tier accordingly.
    ///
    /// A failed probe substitutes a [`NullKvStore`] and marks the tier
    /// unavailable, so the chain skips it instead of surfacing errors
    /// on every lookup.
    pub async fn connect(store: Arc<dyn KvStore>) -> Self {
        match store.get(Self::PROBE_KEY).await {
            Ok(_) => {
                debug!("KV store reachable, tier enabled");
                Self {
                    store,
                    available: true,
                }
            }
            Err(e) => {
                warn!(error = %e, "KV store unreachable, tier disabled");
                Self {
                    store: Arc::new(NullKvStore),
                    available: false,
                }
            }
        }
    }

    /// Wire a store without probing, for stores known to be local.
    pub fn with_store(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            available: true,
        }
    }
}

#[async_trait]
impl CacheProvider for KvProvider {
    fn name(&self) -> &'static str {
        "kv"
    }

    fn priority(&self) -> u8 {
        Self::PRIORITY
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn peek(&self, key: &CacheKey) -> CacheResult<Option<CacheItem>> {
        let Some(bytes) = self.store.get(&key.to_string()).await? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                warn!(key = %key, error = %e, "corrupt KV entry, discarding");
                self.store.delete(&key.to_string()).await?;
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, item: CacheItem) -> CacheResult<()> {
        let bytes = serde_json::to_vec(&item)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Let the store expire the entry on its own as a backstop; the
        // authoritative check stays in CacheItem::state.
        let store_ttl = item.remaining_ttl().max(MIN_STORE_TTL);
        self.store
            .put(&key.to_string(), bytes, Some(store_ttl))
            .await
    }

    async fn has(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.store.get(&key.to_string()).await?.is_some())
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        self.store.delete(&key.to_string()).await
    }

    async fn clear(&self) -> CacheResult<()> {
        for key in self.store.list("").await? {
            if let Err(e) = self.store.delete(&key).await {
                warn!(key = %key, error = %e, "failed to delete KV entry during clear");
            }
        }
        Ok(())
    }

    async fn item_count(&self) -> CacheResult<u64> {
        Ok(self.store.list("").await?.len() as u64)
    }
}
