//! API Handlers
//!
//! HTTP request handlers. Each handler delegates to the read or write
//! orchestrator and turns its outcome into a status code and JSON body.

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    Json,
};
use tracing::warn;

use crate::broker::{AmqpBroker, Broker, RetryPolicy};
use crate::cache::{EventCache, RedisCache};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{
    EventResponse, HealthResponse, PurchaseRequest, PurchaseResponse, PurchaseTransaction,
    RootResponse,
};
use crate::service::{EventReader, Publisher};
use crate::store::{EventStore, PgEventStore, PgStoreOptions};

/// Application state shared across all handlers.
///
/// Holds immutable collaborator handles only; nothing here is mutated by a
/// request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Option<Arc<dyn EventCache>>,
    pub reader: EventReader,
    pub publisher: Publisher,
}

impl AppState {
    /// Wires the orchestrators around the given collaborators.
    pub fn new(
        config: Config,
        cache: Option<Arc<dyn EventCache>>,
        store: Arc<dyn EventStore>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        let reader = EventReader::new(cache.clone(), store)
            .with_cache_ttl(std::time::Duration::from_secs(config.cache_ttl))
            .with_store_connect_timeout(config.db_connect_timeout());
        let publisher = Publisher::new(broker, RetryPolicy::from_config(&config));

        Self {
            config: Arc::new(config),
            cache,
            reader,
            publisher,
        }
    }

    /// Creates the state with Redis, PostgreSQL and RabbitMQ collaborators.
    ///
    /// Nothing is contacted here. A missing `REDIS_HOST` disables the cache.
    pub fn from_config(config: Config) -> Self {
        let cache: Option<Arc<dyn EventCache>> = match config.redis_host.as_deref() {
            Some(host) => {
                match RedisCache::new(host, config.redis_port, config.cache_connect_timeout()) {
                    Ok(cache) => Some(Arc::new(cache)),
                    Err(e) => {
                        warn!(error = %e, "Redis cache disabled");
                        None
                    }
                }
            }
            None => {
                warn!("REDIS_HOST not set, running without cache");
                None
            }
        };
        let store = Arc::new(PgEventStore::new(PgStoreOptions::from_config(&config)));
        let broker = Arc::new(AmqpBroker::from_config(&config));

        Self::new(config, cache, store, broker)
    }
}

/// Handler for GET /
///
/// Liveness report with the node id and collaborator hosts.
pub async fn root_handler(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse::from_config(&state.config))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handler for GET /events/:event_id
///
/// Cache-aside read: 200 with provenance, 404 when the store lacks the
/// event, 503 when neither collaborator can answer.
pub async fn get_event_handler(
    State(state): State<AppState>,
    event_id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<EventResponse>> {
    let Path(event_id) =
        event_id.map_err(|e| ServiceError::InvalidRequest(format!("Invalid event id: {}", e)))?;

    let (event, source) = state.reader.get_event(event_id).await?;
    Ok(Json(EventResponse::new(event, source)))
}

/// Handler for POST /purchase
///
/// Queues the purchase for asynchronous processing. Acceptance depends only
/// on the publish; cache and store are never consulted.
pub async fn purchase_handler(
    State(state): State<AppState>,
    params: std::result::Result<Query<PurchaseRequest>, QueryRejection>,
) -> Result<Json<PurchaseResponse>> {
    let Query(req) = params
        .map_err(|e| ServiceError::InvalidRequest(format!("Invalid purchase parameters: {}", e)))?;

    let transaction = PurchaseTransaction::new(req.user_id, req.event_id, req.quantity);
    state.publisher.publish(&transaction).await?;

    Ok(Json(PurchaseResponse::accepted(&transaction)))
}
