//! Error types for the event node
//!
//! Collaborator adapters convert low-level client failures into the typed
//! errors below; orchestration maps them onto [`ServiceError`], which is the
//! only error type handlers ever see.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Collaborator Errors ==
/// Failures reported by a cache collaborator.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache server could not be reached within its connect timeout
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The cache was reachable but rejected the command
    #[error("Cache command failed: {0}")]
    Command(String),
}

/// Failures reported by the primary store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connecting to the store failed or timed out
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store was connected but the lookup itself failed
    #[error("Store query failed: {0}")]
    Query(String),
}

/// Failures reported by the message broker.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Establishing the broker connection failed or timed out
    #[error("Broker connection failed: {0}")]
    Connect(String),

    /// Opening a channel or declaring the queue failed
    #[error("Broker channel setup failed: {0}")]
    Channel(String),

    /// The broker rejected or dropped a publish
    #[error("Broker publish failed: {0}")]
    Publish(String),

    /// Every connection attempt allowed by the retry policy failed
    #[error("Broker unavailable after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

// == Service Error Enum ==
/// Outcome of a failed read or write orchestration.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Cache could not be consulted; the reader falls back to the store
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Store is down and the cache did not satisfy the read
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store is reachable but the event does not exist
    #[error("Event not found: {0}")]
    NotFound(i64),

    /// Store accepted the connection but the lookup failed
    #[error("Query error: {0}")]
    QueryError(String),

    /// No broker channel could be acquired within the retry budget
    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    /// A channel was acquired but the publish did not go through
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// Malformed request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// HTTP status class for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::CacheUnavailable(_)
            | ServiceError::StoreUnavailable(_)
            | ServiceError::QueryError(_)
            | ServiceError::BrokerUnavailable(_)
            | ServiceError::PublishFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-facing message. Internal detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::NotFound(_) => "Event not found in Database.".to_string(),
            ServiceError::InvalidRequest(msg) => msg.clone(),
            ServiceError::CacheUnavailable(_) | ServiceError::StoreUnavailable(_) => {
                "System unavailable: DB is down and data not found in cache.".to_string()
            }
            ServiceError::QueryError(_) => "Database error during query.".to_string(),
            ServiceError::BrokerUnavailable(_) | ServiceError::PublishFailed(_) => {
                "System critical failure: Cannot queue transaction. Try again later.".to_string()
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.public_message()));
        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for orchestration and handlers.
pub type Result<T> = std::result::Result<T, ServiceError>;
