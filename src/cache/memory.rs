//! In-process cache
//!
//! HashMap-backed [`EventCache`] with lazy TTL expiration. Used when the node
//! runs without Redis in tests, and able to simulate an unreachable cache or
//! rejected writes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheEntry, EventCache};
use crate::error::CacheError;

/// In-memory cache with expiry checked on read.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    offline: AtomicBool,
    reject_writes: AtomicBool,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// When offline every call fails with [`CacheError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// When set, `set` fails with [`CacheError::Command`] while `get` still works.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of `get` calls received, including failed ones.
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls received, including failed ones.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Returns the live entry for `key` without touching counters.
    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read().await;
        entries.get(key).filter(|e| !e.is_expired()).cloned()
    }

    /// Number of stored entries, expired ones included until read.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn check_online(&self) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable(
                "in-memory cache is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EventCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let mut entries = self.entries.write().await;
        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return Ok(None),
        };

        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Command("write rejected".to_string()));
        }

        let entry = CacheEntry::new(value.to_string(), ttl.as_millis() as u64);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }
}
