//! Event record and read provenance

use serde::{Deserialize, Serialize};

/// Prefix for cache keys holding serialized events.
pub const CACHE_KEY_PREFIX: &str = "event:";

/// Builds the cache key for an event id, e.g. `event:999`.
pub fn cache_key(event_id: i64) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, event_id)
}

/// An event as read from the store or the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl Event {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }

    /// The demo record preloaded into the cache at startup.
    pub fn demo() -> Self {
        Self::new(999, "Conferencia Sistemas Dist.", "Resiliencia demo data")
    }
}

/// Where a successful read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Database,
}
