//! In-process event store
//!
//! Fixed set of events with switches for an unreachable store and for
//! failing queries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{EventStore, StoreConnection};
use crate::error::StoreError;
use crate::models::Event;

#[derive(Debug, Default)]
struct Shared {
    offline: AtomicBool,
    failing_queries: AtomicBool,
    connects: AtomicUsize,
    queries: AtomicUsize,
}

/// In-memory [`EventStore`] that counts connections and lookups.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Arc<HashMap<i64, Event>>,
    shared: Arc<Shared>,
}

impl MemoryEventStore {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: Arc::new(events.into_iter().map(|e| (e.id, e)).collect()),
            shared: Arc::new(Shared::default()),
        }
    }

    /// When offline, `connect` fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// When set, lookups fail with [`StoreError::Query`].
    pub fn set_failing_queries(&self, failing: bool) {
        self.shared.failing_queries.store(failing, Ordering::SeqCst);
    }

    /// Number of `connect` calls, successful or not.
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Number of lookups executed.
    pub fn query_count(&self) -> usize {
        self.shared.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn connect(&self, _timeout: Duration) -> Result<Box<dyn StoreConnection>, StoreError> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        if self.shared.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }

        Ok(Box::new(MemoryConnection {
            events: Arc::clone(&self.events),
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct MemoryConnection {
    events: Arc<HashMap<i64, Event>>,
    shared: Arc<Shared>,
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>, StoreError> {
        self.shared.queries.fetch_add(1, Ordering::SeqCst);
        if self.shared.failing_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated query failure".to_string()));
        }
        Ok(self.events.get(&event_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_find_existing_and_missing() {
        let store = MemoryEventStore::new([Event::demo()]);
        let mut conn = store.connect(TIMEOUT).await.unwrap();

        assert_eq!(conn.find_event(999).await.unwrap(), Some(Event::demo()));
        assert_eq!(conn.find_event(1).await.unwrap(), None);
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_store_refuses_connections() {
        let store = MemoryEventStore::new([Event::demo()]);
        store.set_offline(true);

        assert!(matches!(
            store.connect(TIMEOUT).await,
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(store.connect_count(), 1);
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_queries() {
        let store = MemoryEventStore::new([Event::demo()]);
        store.set_failing_queries(true);
        let mut conn = store.connect(TIMEOUT).await.unwrap();

        assert!(matches!(
            conn.find_event(999).await,
            Err(StoreError::Query(_))
        ));
    }
}
