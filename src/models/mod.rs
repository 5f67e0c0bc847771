//! Domain records and HTTP DTOs
//!
//! [`Event`] and [`PurchaseTransaction`] are the records that flow through
//! the read and write paths; the request/response modules define the JSON
//! shapes exchanged with clients.

pub mod event;
pub mod requests;
pub mod responses;
pub mod transaction;

// Re-export commonly used types
pub use event::{cache_key, Event, Provenance};
pub use requests::PurchaseRequest;
pub use responses::{
    EnvironmentInfo, ErrorResponse, EventResponse, HealthResponse, PurchaseResponse,
    RootResponse,
};
pub use transaction::PurchaseTransaction;
