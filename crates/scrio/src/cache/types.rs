//! # Cache Types
//!
//! Shared types for the multi-tier cache: keys, stored items, and the
//! freshness classification applied on every read.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resource::ResourceCategory;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, std::io::Error>;

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Key identifying a cached entry.
///
/// Rendered as `{version}:{category}:{identifier}`, so bumping the data
/// version namespace invalidates every prior entry at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Application data version namespace
    pub version: String,
    /// Expiration category of the entry
    pub category: ResourceCategory,
    /// Identifier within the category
    pub identifier: String,
}

impl CacheKey {
    pub fn new(
        version: impl Into<String>,
        category: ResourceCategory,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            category,
            identifier: identifier.into(),
        }
    }

    /// Generate a filesystem-safe entry name from the key.
    pub fn to_filename(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_string().as_bytes());
        let hash = hasher.finalize();
        format!("{hash:x}")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.version, self.category, self.identifier)
    }
}

/// Freshness classification of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    /// Within its lifetime and written under the current data version
    Fresh,
    /// Past its absolute expiry time
    Expired,
    /// Written under a different data version
    VersionMismatch,
}

/// A cached value with absolute expiry and the data version that wrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheItem {
    /// Cached payload
    pub value: serde_json::Value,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: u64,
    /// Data version the item was written under
    pub version: String,
    /// Write time as seconds since the Unix epoch
    pub created_at: u64,
}

impl CacheItem {
    pub fn new(value: serde_json::Value, ttl: Duration, version: impl Into<String>) -> Self {
        let created_at = unix_now();
        Self {
            value,
            expires_at: created_at.saturating_add(ttl.as_secs()),
            version: version.into(),
            created_at,
        }
    }

    /// Whether the item is past its expiry time.
    pub fn is_expired(&self) -> bool {
        unix_now() >= self.expires_at
    }

    /// Classify the item against the current data version.
    ///
    /// A version mismatch wins over expiry so eviction logs name the
    /// actual cause after a deploy.
    pub fn state(&self, current_version: &str) -> ItemState {
        if self.version != current_version {
            ItemState::VersionMismatch
        } else if self.is_expired() {
            ItemState::Expired
        } else {
            ItemState::Fresh
        }
    }

    pub fn is_fresh(&self, current_version: &str) -> bool {
        self.state(current_version) == ItemState::Fresh
    }

    /// Remaining lifetime, zero once expired.
    pub fn remaining_ttl(&self) -> Duration {
        Duration::from_secs(self.expires_at.saturating_sub(unix_now()))
    }

    /// Copy of the item for warming a higher tier.
    ///
    /// The copy expires at most `cap` from now and never later than the
    /// original, so a propagated entry cannot outlive its source.
    pub fn warmed(&self, cap: Duration) -> Self {
        let mut item = self.clone();
        item.expires_at = item.expires_at.min(unix_now().saturating_add(cap.as_secs()));
        item
    }
}
