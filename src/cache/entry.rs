//! Cache Entry Module
//!
//! Entry stored by [`super::MemoryCache`], expiring at a fixed instant.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached value and its expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    /// Creates an entry expiring `ttl_ms` milliseconds from now.
    pub fn new(value: String, ttl_ms: u64) -> Self {
        Self {
            value,
            expires_at: current_timestamp_ms().saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }

    /// Remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
