//! Cache-Aside Reader
//!
//! Reads an event from the cache first and falls back to the store. A store
//! hit is written back to the cache. The ladder, in order:
//!
//! 1. cache hit: served from cache, store untouched, TTL not refreshed
//! 2. cache miss, or cache unreachable: connect to the store
//! 3. store unreachable: `StoreUnavailable`
//! 4. record found: write back (best effort), served from database
//! 5. record absent: `NotFound`; lookup failure: `QueryError`

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{EventCache, DEFAULT_EVENT_TTL};
use crate::error::{CacheError, Result, ServiceError, StoreError};
use crate::models::{cache_key, Event, Provenance};
use crate::store::EventStore;

/// Cache-aside read orchestration.
#[derive(Clone)]
pub struct EventReader {
    cache: Option<Arc<dyn EventCache>>,
    store: Arc<dyn EventStore>,
    cache_ttl: Duration,
    store_connect_timeout: Duration,
}

impl EventReader {
    /// Creates a reader. `cache` is `None` when no cache is configured.
    pub fn new(cache: Option<Arc<dyn EventCache>>, store: Arc<dyn EventStore>) -> Self {
        Self {
            cache,
            store,
            cache_ttl: DEFAULT_EVENT_TTL,
            store_connect_timeout: Duration::from_secs(1),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_store_connect_timeout(mut self, timeout: Duration) -> Self {
        self.store_connect_timeout = timeout;
        self
    }

    // == Get Event ==
    /// Returns the event and where it was served from.
    pub async fn get_event(&self, event_id: i64) -> Result<(Event, Provenance)> {
        let key = cache_key(event_id);

        match self.read_cache(&key).await {
            Ok(Some(event)) => {
                debug!(event_id, "Served event from cache");
                return Ok((event, Provenance::Cache));
            }
            Ok(None) => debug!(event_id, "Cache miss"),
            Err(e) => warn!(event_id, error = %e, "Cache unavailable, falling back to store"),
        }

        let mut conn = self
            .store
            .connect(self.store_connect_timeout)
            .await
            .map_err(|e| {
                warn!(event_id, error = %e, "Store unavailable and cache did not satisfy read");
                ServiceError::StoreUnavailable(e.to_string())
            })?;

        let event = match conn.find_event(event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => return Err(ServiceError::NotFound(event_id)),
            Err(StoreError::Unavailable(msg)) => {
                warn!(event_id, error = %msg, "Store dropped during query");
                return Err(ServiceError::QueryError(msg));
            }
            Err(StoreError::Query(msg)) => {
                warn!(event_id, error = %msg, "Store query failed");
                return Err(ServiceError::QueryError(msg));
            }
        };

        self.write_back(&key, &event).await;
        Ok((event, Provenance::Database))
    }

    /// Looks the key up in the cache. Undecodable entries count as misses.
    async fn read_cache(&self, key: &str) -> Result<Option<Event>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };

        let raw = cache.get(key).await.map_err(|e| match e {
            CacheError::Unavailable(msg) | CacheError::Command(msg) => {
                ServiceError::CacheUnavailable(msg)
            }
        })?;

        Ok(raw.and_then(|value| match serde_json::from_str::<Event>(&value) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(key, error = %e, "Ignoring undecodable cache entry");
                None
            }
        }))
    }

    /// Best-effort cache repopulation; failures never fail the read.
    async fn write_back(&self, key: &str, event: &Event) {
        let Some(cache) = &self.cache else {
            return;
        };

        let value = match serde_json::to_string(event) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Could not serialize event for cache");
                return;
            }
        };

        match cache.set(key, &value, self.cache_ttl).await {
            Ok(()) => info!(
                key,
                ttl_secs = self.cache_ttl.as_secs(),
                "Cache repopulated from store"
            ),
            Err(e) => warn!(key, error = %e, "Cache write-back failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::store::MemoryEventStore;

    struct Fixture {
        cache: Arc<MemoryCache>,
        store: Arc<MemoryEventStore>,
        reader: EventReader,
    }

    fn fixture() -> Fixture {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new([Event::new(
            42,
            "Rust Meetup",
            "Monthly meetup",
        )]));
        let reader = EventReader::new(Some(cache.clone()), store.clone());
        Fixture {
            cache,
            store,
            reader,
        }
    }

    async fn seed(cache: &MemoryCache, event: &Event) {
        cache
            .set(
                &cache_key(event.id),
                &serde_json::to_string(event).unwrap(),
                DEFAULT_EVENT_TTL,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let f = fixture();
        seed(&f.cache, &Event::demo()).await;

        let (event, source) = f.reader.get_event(999).await.unwrap();

        assert_eq!(event, Event::demo());
        assert_eq!(source, Provenance::Cache);
        assert_eq!(f.store.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_store_hit_writes_back() {
        let f = fixture();

        let (_, first) = f.reader.get_event(42).await.unwrap();
        let (event, second) = f.reader.get_event(42).await.unwrap();

        assert_eq!(first, Provenance::Database);
        assert_eq!(second, Provenance::Cache);
        assert_eq!(event.name, "Rust Meetup");
        assert_eq!(f.store.connect_count(), 1);

        let entry = f.cache.peek("event:42").await.unwrap();
        assert!(entry.ttl_remaining_ms() > 299_000);
    }

    #[tokio::test]
    async fn test_both_down_is_unavailable() {
        let f = fixture();
        f.cache.set_offline(true);
        f.store.set_offline(true);

        let result = f.reader.get_event(42).await;

        assert!(matches!(result, Err(ServiceError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_cache_down_falls_back_to_store() {
        let f = fixture();
        f.cache.set_offline(true);

        let (_, source) = f.reader.get_event(42).await.unwrap();

        assert_eq!(source, Provenance::Database);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let f = fixture();

        let result = f.reader.get_event(7).await;

        assert!(matches!(result, Err(ServiceError::NotFound(7))));
        assert_eq!(f.cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_query_failure_is_query_error() {
        let f = fixture();
        f.store.set_failing_queries(true);

        let result = f.reader.get_event(42).await;

        assert!(matches!(result, Err(ServiceError::QueryError(_))));
    }

    #[tokio::test]
    async fn test_write_back_failure_does_not_fail_read() {
        let f = fixture();
        f.cache.set_reject_writes(true);

        let (_, source) = f.reader.get_event(42).await.unwrap();

        assert_eq!(source, Provenance::Database);
        assert_eq!(f.cache.set_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_a_miss() {
        let f = fixture();
        f.cache
            .set("event:42", "not json", DEFAULT_EVENT_TTL)
            .await
            .unwrap();

        let (event, source) = f.reader.get_event(42).await.unwrap();

        assert_eq!(source, Provenance::Database);
        assert_eq!(event.id, 42);
        assert!(f.cache.peek("event:42").await.unwrap().value.contains("Rust Meetup"));
    }

    #[tokio::test]
    async fn test_no_cache_configured() {
        let store = Arc::new(MemoryEventStore::new([Event::demo()]));
        let reader = EventReader::new(None, store.clone());

        let (_, first) = reader.get_event(999).await.unwrap();
        let (_, second) = reader.get_event(999).await.unwrap();

        assert_eq!(first, Provenance::Database);
        assert_eq!(second, Provenance::Database);
        assert_eq!(store.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_write_back_reads_from_database_again() {
        let f = fixture();
        let reader = f.reader.clone().with_cache_ttl(Duration::from_millis(20));

        let (_, first) = reader.get_event(42).await.unwrap();
        let (_, second) = reader.get_event(42).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (event, third) = reader.get_event(42).await.unwrap();

        assert_eq!(first, Provenance::Database);
        assert_eq!(second, Provenance::Cache);
        assert_eq!(third, Provenance::Database);
        assert_eq!(event.name, "Rust Meetup");
        assert_eq!(f.store.connect_count(), 2);
    }

    #[tokio::test]
    async fn test_configured_ttl_is_applied() {
        let f = fixture();
        let reader = f.reader.clone().with_cache_ttl(Duration::from_secs(10));

        reader.get_event(42).await.unwrap();

        let entry = f.cache.peek("event:42").await.unwrap();
        assert!(entry.ttl_remaining_ms() <= 10_000);
    }
}
