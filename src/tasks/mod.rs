//! Startup Tasks Module
//!
//! One-off tasks run before the server starts accepting requests.
//!
//! # Tasks
//! - Demo preload: Seeds the demo event into the cache

mod preload;

pub use preload::preload_demo_event;
