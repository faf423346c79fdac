//! # Cache Provider Interface
//!
//! Contract shared by every storage tier. Tiers differ in speed and
//! durability; the chain walks them by descending priority.

use async_trait::async_trait;
use tracing::debug;

use crate::cache::types::{CacheItem, CacheKey, CacheResult, ItemState};

/// Interface for cache storage tiers
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Tier name used in logs and stats
    fn name(&self) -> &'static str;

    /// Tier rank; higher ranks are consulted first
    fn priority(&self) -> u8;

    /// Whether the tier can serve requests right now
    async fn is_available(&self) -> bool {
        true
    }

    /// Raw read without freshness classification
    async fn peek(&self, key: &CacheKey) -> CacheResult<Option<CacheItem>>;

    /// Store an item, replacing any existing entry for the key
    async fn set(&self, key: &CacheKey, item: CacheItem) -> CacheResult<()>;

    /// Whether an entry exists for the key, fresh or not
    async fn has(&self, key: &CacheKey) -> CacheResult<bool>;

    /// Remove the entry for the key, if any
    async fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Remove every entry in the tier
    async fn clear(&self) -> CacheResult<()>;

    /// Number of stored entries. Stale entries count until a read
    /// evicts them.
    async fn item_count(&self) -> CacheResult<u64>;

    /// Freshness-checked read.
    ///
    /// Expired and version-mismatched entries are deleted on sight and
    /// reported as misses, so storage is reclaimed lazily without a
    /// sweeper task.
    async fn get(&self, key: &CacheKey, current_version: &str) -> CacheResult<Option<CacheItem>> {
        match self.peek(key).await? {
            Some(item) => match item.state(current_version) {
                ItemState::Fresh => Ok(Some(item)),
                state => {
                    debug!(key = %key, provider = self.name(), ?state, "evicting stale entry");
                    self.delete(key).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}
