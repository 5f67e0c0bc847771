//! Cache Module
//!
//! Cache collaborators for the cache-aside read path. The reader only needs
//! `get` and `set`-with-expiry; both report failures as [`CacheError`] so an
//! unreachable cache can be treated as a miss.

mod entry;
mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheError;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

// == Public Constants ==
/// TTL applied to cached events when none is configured
pub const DEFAULT_EVENT_TTL: Duration = Duration::from_secs(300);

/// Key/value cache with per-entry expiry.
#[async_trait]
pub trait EventCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}
