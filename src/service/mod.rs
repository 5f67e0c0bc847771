//! Service Module
//!
//! Resilience orchestration for the read and write paths. Both components
//! hold injected collaborator handles and keep no per-request state.

mod publisher;
mod reader;


pub use publisher::Publisher;
pub use reader::EventReader;
