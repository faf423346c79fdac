//! # Memory Cache Provider
//!
//! Fastest tier, first in the chain. Entries live in a bounded moka
//! cache and vanish on restart; durability is the job of the tiers
//! below.

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::cache::providers::provider::CacheProvider;
use crate::cache::types::{CacheItem, CacheKey, CacheResult};

/// In-memory cache tier backed by moka
#[derive(Clone)]
pub struct MemoryProvider {
    cache: MokaCache<CacheKey, CacheItem>,
}

impl MemoryProvider {
    /// Chain rank of the memory tier.
    pub const PRIORITY: u8 = 100;

    /// Create a tier holding at most `max_entries` items.
    ///
    /// moka evicts least-recently-used entries past the bound; stale
    /// entries additionally leave on read via [`CacheProvider::get`].
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is 0.
    pub fn new(max_entries: u64) -> Self {
        if max_entries == 0 {
            panic!("Memory cache capacity must be greater than 0");
        }

        let cache = MokaCache::builder().max_capacity(max_entries).build();
        debug!(max_entries, "memory cache provider created");
        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn priority(&self) -> u8 {
        Self::PRIORITY
    }

    async fn peek(&self, key: &CacheKey) -> CacheResult<Option<CacheItem>> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &CacheKey, item: CacheItem) -> CacheResult<()> {
        self.cache.insert(key.clone(), item).await;
        Ok(())
    }

    async fn has(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }

    async fn item_count(&self) -> CacheResult<u64> {
        // Settle pending maintenance so the count reflects recent writes.
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::unix_now;
    use crate::resource::ResourceCategory;
    use serde_json::json;
    use std::time::Duration;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }

    fn test_key(identifier: &str) -> CacheKey {
        CacheKey::new("1", ResourceCategory::Scripture, identifier)
    }

    fn fresh_item() -> CacheItem {
        CacheItem::new(json!({"items": [1, 2]}), Duration::from_secs(300), "1")
    }

    fn expired_item() -> CacheItem {
        CacheItem {
            value: json!({"items": [1]}),
            expires_at: unix_now().saturating_sub(5),
            version: "1".to_string(),
            created_at: unix_now().saturating_sub(600),
        }
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        init_tracing();
        let provider = MemoryProvider::new(16);
        let key = test_key("org/en_ult@master");

        provider.set(&key, fresh_item()).await.unwrap();

        let found = provider.get(&key, "1").await.unwrap();
        assert!(found.is_some());
        assert!(provider.has(&key).await.unwrap());
        assert_eq!(provider.item_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_evicted_on_read() {
        init_tracing();
        let provider = MemoryProvider::new(16);
        let key = test_key("org/en_ult@master");

        provider.set(&key, expired_item()).await.unwrap();
        assert_eq!(provider.item_count().await.unwrap(), 1);

        assert!(provider.get(&key, "1").await.unwrap().is_none());

        // The read deleted the entry, so the count drops too.
        assert!(!provider.has(&key).await.unwrap());
        assert_eq!(provider.item_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_version_mismatch_evicted_on_read() {
        init_tracing();
        let provider = MemoryProvider::new(16);
        let key = test_key("org/en_ult@master");

        provider.set(&key, fresh_item()).await.unwrap();

        assert!(provider.get(&key, "2").await.unwrap().is_none());
        assert!(!provider.has(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_peek_returns_stale_entries() {
        init_tracing();
        let provider = MemoryProvider::new(16);
        let key = test_key("org/en_ult@master");

        provider.set(&key, expired_item()).await.unwrap();

        // peek is the raw read the chain uses for stale fallback.
        let peeked = provider.peek(&key).await.unwrap().unwrap();
        assert!(peeked.is_expired());
        assert!(provider.has(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        init_tracing();
        let provider = MemoryProvider::new(16);
        let first = test_key("org/en_ult@master");
        let second = test_key("org/en_ust@master");

        provider.set(&first, fresh_item()).await.unwrap();
        provider.set(&second, fresh_item()).await.unwrap();

        provider.delete(&first).await.unwrap();
        assert!(!provider.has(&first).await.unwrap());
        assert!(provider.has(&second).await.unwrap());

        provider.clear().await.unwrap();
        assert_eq!(provider.item_count().await.unwrap(), 0);
    }

    #[test]
    #[should_panic(expected = "greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = MemoryProvider::new(0);
    }
}
