//! # Scrio
//!
//! A library for retrieving and caching translation resources from a
//! git-hosted upstream catalog. Repositories arrive as whole archives,
//! are extracted in memory, and the assembled content is served through
//! a multi-tier cache that keeps working offline.
//!
//! ## Features
//!
//! - Layered cache (memory, filesystem, remote KV) with priority walk
//! - Hit warming of faster tiers with conservative TTLs
//! - Validation guard against caching empty or error payloads
//! - Cached upstream reachability with stale fallback when offline
//! - ZIP and GZIP+TAR archive extraction with hard limits

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod kv;
pub mod network;
pub mod orchestrator;
pub mod resource;
pub mod upstream;

pub use cache::{
    CacheItem, CacheKey, CacheProvider, CacheResult, CacheValidator, ChainLookup, FileProvider,
    ItemState, KvProvider, MemoryProvider, ProviderChain, TierStats, Validation, ValidationMode,
};
pub use config::{
    CacheConfig, DEFAULT_UPSTREAM_URL, KvConfig, MonitorConfig, ResourceCacheConfig,
    ResourceCacheConfigBuilder, TtlPolicy, UpstreamConfig,
};
pub use error::ResourceError;
pub use kv::{KvStore, MemoryKvStore, NullKvStore, RestKvStore};
pub use network::{NetworkMonitor, NetworkStatus, StatusSubscription};
pub use orchestrator::{ResourceCache, ResourceContent, ResourceOrigin};
pub use resource::{DEFAULT_REF, ResourceCategory, ResourceDescriptor, ResourceType};
pub use upstream::{ArchiveFlavor, UpstreamSource};

// Re-export the HTTP client constructor
pub use client::create_client;

// Re-export the extraction surface consumers commonly touch
pub use rc_archive::{ArchiveType, ExtractedFile, ExtractionLimits, detect_archive_type};
