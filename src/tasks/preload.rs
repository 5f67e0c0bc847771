//! Demo Event Preload
//!
//! Seeds `event:999` into the cache at startup so the read path can be
//! exercised with the store down.

use std::time::Duration;

use tracing::{info, warn};

use crate::cache::EventCache;
use crate::models::{cache_key, Event};

/// Writes the demo event into `cache` with the given TTL.
///
/// Best effort: returns whether the preload succeeded, and logs a warning
/// instead of failing startup when it did not.
pub async fn preload_demo_event(cache: &dyn EventCache, ttl: Duration) -> bool {
    let event = Event::demo();
    let key = cache_key(event.id);

    let value = match serde_json::to_string(&event) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Could not serialize demo event");
            return false;
        }
    };

    match cache.set(&key, &value, ttl).await {
        Ok(()) => {
            info!(key = %key, "Demo event preloaded into cache");
            true
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Could not preload demo event");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn test_preload_seeds_demo_event() {
        let cache = MemoryCache::new();

        assert!(preload_demo_event(&cache, Duration::from_secs(300)).await);

        let raw = cache.get("event:999").await.unwrap().unwrap();
        let event: Event = serde_json::from_str(&raw).unwrap();
        assert_eq!(event, Event::demo());
    }

    #[tokio::test]
    async fn test_preload_failure_is_not_fatal() {
        let cache = MemoryCache::new();
        cache.set_offline(true);

        assert!(!preload_demo_event(&cache, Duration::from_secs(300)).await);
    }
}
