//! # Cache Providers
//!
//! The individual storage tiers the chain is assembled from.

// Re-export providers for easier access
pub use self::file::FileProvider;
pub use self::kv::KvProvider;
pub use self::memory::MemoryProvider;
pub use self::provider::CacheProvider;

// Provider interface
pub mod provider;

// Individual provider implementations
pub mod file;
pub mod kv;
pub mod memory;
