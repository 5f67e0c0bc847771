//! Configuration Module
//!
//! Handles loading node configuration from environment variables.
//!
//! Collaborator hosts are optional: a missing host degrades the matching
//! path (no cache, store unavailable, broker unavailable) instead of failing
//! startup.

use std::env;
use std::time::Duration;

/// Node configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Identifier reported by `GET /`
    pub node_id: String,
    /// HTTP server port
    pub server_port: u16,
    /// PostgreSQL host
    pub db_host: Option<String>,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    /// Redis host
    pub redis_host: Option<String>,
    pub redis_port: u16,
    /// RabbitMQ host
    pub rabbitmq_host: Option<String>,
    pub rabbitmq_port: u16,
    /// TTL in seconds for cached events
    pub cache_ttl: u64,
    /// Connect timeouts in milliseconds
    pub db_connect_timeout_ms: u64,
    pub cache_connect_timeout_ms: u64,
    pub broker_connect_timeout_ms: u64,
    /// Total broker connection attempts per publish
    pub broker_max_retries: u32,
    /// Constant delay between broker connection attempts in milliseconds
    pub broker_retry_delay_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `NODE_ID` (default: UNKNOWN)
    /// - `SERVER_PORT` (default: 8000)
    /// - `DB_HOST`, `DB_PORT` (5432), `DB_NAME` (eventflow_db), `DB_USER`, `DB_PASSWORD`
    /// - `REDIS_HOST`, `REDIS_PORT` (6379)
    /// - `RABBITMQ_HOST`, `RABBITMQ_PORT` (5672)
    /// - `CACHE_TTL` (300)
    /// - `DB_CONNECT_TIMEOUT_MS` (1000), `CACHE_CONNECT_TIMEOUT_MS` (1000),
    ///   `BROKER_CONNECT_TIMEOUT_MS` (2000)
    /// - `BROKER_MAX_RETRIES` (5), `BROKER_RETRY_DELAY_MS` (1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            node_id: env::var("NODE_ID").unwrap_or(defaults.node_id),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            db_host: host_var("DB_HOST"),
            db_port: parse_var("DB_PORT").unwrap_or(defaults.db_port),
            db_name: env::var("DB_NAME").unwrap_or(defaults.db_name),
            db_user: env::var("DB_USER").unwrap_or(defaults.db_user),
            db_password: env::var("DB_PASSWORD").unwrap_or(defaults.db_password),
            redis_host: host_var("REDIS_HOST"),
            redis_port: parse_var("REDIS_PORT").unwrap_or(defaults.redis_port),
            rabbitmq_host: host_var("RABBITMQ_HOST"),
            rabbitmq_port: parse_var("RABBITMQ_PORT").unwrap_or(defaults.rabbitmq_port),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            db_connect_timeout_ms: parse_var("DB_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.db_connect_timeout_ms),
            cache_connect_timeout_ms: parse_var("CACHE_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.cache_connect_timeout_ms),
            broker_connect_timeout_ms: parse_var("BROKER_CONNECT_TIMEOUT_MS")
                .unwrap_or(defaults.broker_connect_timeout_ms),
            broker_max_retries: parse_var("BROKER_MAX_RETRIES")
                .unwrap_or(defaults.broker_max_retries),
            broker_retry_delay_ms: parse_var("BROKER_RETRY_DELAY_MS")
                .unwrap_or(defaults.broker_retry_delay_ms),
        }
    }

    pub fn db_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.db_connect_timeout_ms)
    }

    pub fn cache_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_connect_timeout_ms)
    }

    pub fn broker_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.broker_connect_timeout_ms)
    }

    pub fn broker_retry_delay(&self) -> Duration {
        Duration::from_millis(self.broker_retry_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "UNKNOWN".to_string(),
            server_port: 8000,
            db_host: None,
            db_port: 5432,
            db_name: "eventflow_db".to_string(),
            db_user: "user".to_string(),
            db_password: "password".to_string(),
            redis_host: None,
            redis_port: 6379,
            rabbitmq_host: None,
            rabbitmq_port: 5672,
            cache_ttl: 300,
            db_connect_timeout_ms: 1000,
            cache_connect_timeout_ms: 1000,
            broker_connect_timeout_ms: 2000,
            broker_max_retries: 5,
            broker_retry_delay_ms: 1000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Reads a host variable, treating an empty value as unset.
fn host_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
