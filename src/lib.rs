//! EventFlow Node - event ticketing node
//!
//! Serves event reads through a cache-aside ladder (Redis, then PostgreSQL)
//! and accepts ticket purchases by queueing them on a durable RabbitMQ queue.

pub mod api;
pub mod broker;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::preload_demo_event;
