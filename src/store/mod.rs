//! Store Module
//!
//! Primary store collaborators. A read opens a fresh connection with a short
//! timeout so that a store outage is reported as
//! [`StoreError::Unavailable`] quickly, distinct from a failing query.

mod memory;
mod postgres;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::Event;

pub use memory::MemoryEventStore;
pub use postgres::{PgEventStore, PgStoreOptions};

/// Primary store for event records.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Opens a connection, failing with [`StoreError::Unavailable`] when the
    /// store cannot be reached within `timeout`.
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn StoreConnection>, StoreError>;
}

/// An open store connection, released when dropped.
#[async_trait]
pub trait StoreConnection: Send {
    /// Looks up an event; `Ok(None)` means the store answered and the record
    /// does not exist.
    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>, StoreError>;
}
