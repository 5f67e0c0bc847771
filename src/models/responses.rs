//! Response DTOs for the node API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::config::Config;
use crate::models::{Event, Provenance, PurchaseTransaction};

/// Collaborator hosts reported by `GET /`
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub db: Option<String>,
    pub cache: Option<String>,
    pub queue: Option<String>,
}

/// Response body for the liveness endpoint (GET /)
#[derive(Debug, Clone, Serialize)]
pub struct RootResponse {
    pub status: String,
    pub message: String,
    pub node_id: String,
    pub environment: EnvironmentInfo,
}

impl RootResponse {
    /// Builds the liveness report from the node configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            status: "up".to_string(),
            message: format!(
                "Hello from Node {} (Port {})",
                config.node_id, config.server_port
            ),
            node_id: config.node_id.clone(),
            environment: EnvironmentInfo {
                db: config.db_host.clone(),
                cache: config.redis_host.clone(),
                queue: config.rabbitmq_host.clone(),
            },
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "ok"
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /events/:event_id
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub source: Provenance,
    pub event: Event,
}

impl EventResponse {
    pub fn new(event: Event, source: Provenance) -> Self {
        Self { source, event }
    }
}

/// Response body for POST /purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    /// Always "ACCEPTED_ASYNC"
    pub status: String,
    pub message: String,
    pub transaction_id: String,
}

impl PurchaseResponse {
    /// Acknowledges a transaction that reached the broker queue
    pub fn accepted(transaction: &PurchaseTransaction) -> Self {
        Self {
            status: "ACCEPTED_ASYNC".to_string(),
            message: "Transaction accepted and queued for processing.".to_string(),
            transaction_id: transaction.transaction_id.clone(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
