//! # File Cache Provider
//!
//! Durable tier below memory. Each entry is a single JSON document
//! named by the sha256 of its key, written via a temp file rename so a
//! crash mid-write never leaves a half document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::cache::providers::provider::CacheProvider;
use crate::cache::types::{CacheItem, CacheKey, CacheResult};

/// Filesystem cache tier
pub struct FileProvider {
    cache_dir: PathBuf,
    initialized: AtomicBool,
}

impl FileProvider {
    /// Chain rank of the file tier.
    pub const PRIORITY: u8 = 75;

    /// Create a tier rooted at `cache_dir`. The directory is created
    /// lazily on the first write.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.to_filename()))
    }

    async fn ensure_initialized(&self) -> CacheResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        fs::create_dir_all(&self.cache_dir).await?;

        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(dir = %self.cache_dir.display(), "file cache initialized");
        }
        Ok(())
    }

    /// Discard an unreadable entry off the read path.
    fn remove_corrupt(&self, path: PathBuf) {
        tokio::spawn(async move {
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove corrupt cache entry");
                }
            }
        });
    }
}

#[async_trait]
impl CacheProvider for FileProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn priority(&self) -> u8 {
        Self::PRIORITY
    }

    async fn peek(&self, key: &CacheKey) -> CacheResult<Option<CacheItem>> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match serde_json::from_slice(&bytes) {
            Ok(item) => Ok(Some(item)),
            Err(e) => {
                warn!(key = %key, path = %path.display(), error = %e, "corrupt cache entry, discarding");
                self.remove_corrupt(path);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &CacheKey, item: CacheItem) -> CacheResult<()> {
        self.ensure_initialized().await?;

        let bytes = serde_json::to_vec(&item)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
        let path = self.entry_path(key);
        let tmp = path.with_extension("tmp");

        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &path).await?;
        debug!(key = %key, bytes = bytes.len(), "cache entry written to disk");
        Ok(())
    }

    async fn has(&self, key: &CacheKey) -> CacheResult<bool> {
        fs::try_exists(self.entry_path(key)).await
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.ends_with(".json") && !name.ends_with(".tmp") {
                continue;
            }
            if let Err(e) = fs::remove_file(entry.path()).await {
                if e.kind() != ErrorKind::NotFound {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn item_count(&self) -> CacheResult<u64> {
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().ends_with(".json") {
                count += 1;
            }
        }
        Ok(count)
    }
}
