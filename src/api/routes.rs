//! API Routes
//!
//! Configures the Axum router with all node endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_event_handler, health_handler, purchase_handler, root_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/events/:event_id", get(get_event_handler))
        .route("/purchase", post(purchase_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
