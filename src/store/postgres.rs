//! PostgreSQL event store
//!
//! Each read opens a single `PgConnection` rather than holding a pool, so
//! the connect timeout applies to every request and a down database is
//! detected per read.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::debug;

use super::{EventStore, StoreConnection};
use crate::config::Config;
use crate::error::StoreError;
use crate::models::Event;

const FIND_EVENT_SQL: &str =
    "SELECT id::BIGINT, name, description FROM events WHERE id = $1";

/// Connection parameters for [`PgEventStore`].
#[derive(Debug, Clone)]
pub struct PgStoreOptions {
    /// `None` leaves the store permanently unavailable
    pub host: Option<String>,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PgStoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.db_host.clone(),
            port: config.db_port,
            database: config.db_name.clone(),
            user: config.db_user.clone(),
            password: config.db_password.clone(),
        }
    }
}

/// PostgreSQL-backed [`EventStore`].
#[derive(Debug, Clone)]
pub struct PgEventStore {
    options: PgStoreOptions,
}

impl PgEventStore {
    pub fn new(options: PgStoreOptions) -> Self {
        Self { options }
    }

    fn connect_options(&self) -> Result<PgConnectOptions, StoreError> {
        let host = self
            .options
            .host
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("DB_HOST is not configured".to_string()))?;

        Ok(PgConnectOptions::new()
            .host(host)
            .port(self.options.port)
            .database(&self.options.database)
            .username(&self.options.user)
            .password(&self.options.password)
            .disable_statement_logging())
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn connect(&self, timeout: Duration) -> Result<Box<dyn StoreConnection>, StoreError> {
        let options = self.connect_options()?;

        match tokio::time::timeout(timeout, PgConnection::connect_with(&options)).await {
            Ok(Ok(conn)) => Ok(Box::new(PgStoreConnection { conn })),
            Ok(Err(e)) => Err(StoreError::Unavailable(format!(
                "Failed to connect to database: {}",
                e
            ))),
            Err(_) => Err(StoreError::Unavailable(format!(
                "Database connection timed out after {:?}",
                timeout
            ))),
        }
    }
}

struct PgStoreConnection {
    conn: PgConnection,
}

#[async_trait]
impl StoreConnection for PgStoreConnection {
    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let row: Option<(i64, String, String)> = sqlx::query_as(FIND_EVENT_SQL)
            .bind(event_id)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(|e: sqlx::Error| StoreError::Query(e.to_string()))?;

        debug!(event_id, found = row.is_some(), "Event lookup finished");
        Ok(row.map(|(id, name, description)| Event::new(id, name, description)))
    }
}
