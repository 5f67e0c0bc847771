//! API Module
//!
//! HTTP handlers and routing for the event node.
//!
//! # Endpoints
//! - `GET /` - Liveness and environment report
//! - `GET /health` - Health check endpoint
//! - `GET /events/:event_id` - Cache-aside event read
//! - `POST /purchase` - Queue a ticket purchase

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
