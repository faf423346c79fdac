//! # Cache System
//!
//! Multi-tier cache for extracted resource content. Lookups walk the
//! tiers from fastest to slowest, hits warm the tiers above, and a
//! validator keeps empty or error-shaped payloads from being persisted
//! in the first place.

// Module declarations
mod chain;
pub mod providers;
mod types;
mod validator;

// Re-export primary types from our various modules
pub use chain::{ChainLookup, ProviderChain, TierStats};
pub use types::{CacheItem, CacheKey, CacheResult, ItemState};
pub(crate) use types::unix_now;
pub use validator::{CacheValidator, Validation, ValidationMode};

pub use providers::{CacheProvider, FileProvider, KvProvider, MemoryProvider};
