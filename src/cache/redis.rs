//! Redis cache collaborator
//!
//! Opens a multiplexed connection per call. The connect and the command
//! together are bounded by one timeout, so a Redis outage or a server that
//! stops answering surfaces as [`CacheError::Unavailable`] within that bound.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::debug;

use super::EventCache;
use crate::error::CacheError;

/// Redis-backed [`EventCache`].
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    connect_timeout: Duration,
}

impl RedisCache {
    /// Creates a cache for `redis://{host}:{port}`.
    ///
    /// No connection is made here; failures surface on the first call.
    pub fn new(host: &str, port: u16, connect_timeout: Duration) -> Result<Self, CacheError> {
        let client = Client::open(format!("redis://{}:{}", host, port))
            .map_err(|e| CacheError::Unavailable(format!("Invalid Redis address: {}", e)))?;

        Ok(Self {
            client,
            connect_timeout,
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Failed to get Redis connection: {}", e)))
    }

    /// Runs `call` within the configured timeout.
    async fn bounded<T>(
        &self,
        command: &str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.connect_timeout, call)
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!(
                    "Redis {} timed out after {:?}",
                    command, self.connect_timeout
                ))
            })?
    }
}

#[async_trait]
impl EventCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded("GET", async {
            let mut conn = self.get_connection().await?;
            conn.get::<_, Option<String>>(key)
                .await
                .map_err(|e| CacheError::Command(format!("Redis GET failed: {}", e)))
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // SETEX rejects zero; round sub-second TTLs up to one second
        let seconds = ttl.as_secs().max(1);

        self.bounded("SETEX", async {
            let mut conn = self.get_connection().await?;
            conn.set_ex::<_, _, ()>(key, value, seconds)
                .await
                .map_err(|e| CacheError::Command(format!("Redis SETEX failed: {}", e)))
        })
        .await?;

        debug!(key, seconds, "Cached value in Redis");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_redis_is_unavailable() {
        // Port 1 on localhost refuses connections
        let cache = RedisCache::new("127.0.0.1", 1, Duration::from_millis(200)).unwrap();

        assert!(matches!(
            cache.get("event:1").await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(matches!(
            cache.set("event:1", "{}", Duration::from_secs(1)).await,
            Err(CacheError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_redis_is_unavailable_within_timeout() {
        // Accepts connections and never replies
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let cache = RedisCache::new("127.0.0.1", port, Duration::from_millis(200)).unwrap();
        let start = std::time::Instant::now();

        let get = tokio::time::timeout(Duration::from_secs(5), cache.get("event:1"))
            .await
            .expect("GET is bounded by the cache timeout");
        let set = tokio::time::timeout(
            Duration::from_secs(5),
            cache.set("event:1", "{}", Duration::from_secs(1)),
        )
        .await
        .expect("SETEX is bounded by the cache timeout");

        assert!(matches!(get, Err(CacheError::Unavailable(_))));
        assert!(matches!(set, Err(CacheError::Unavailable(_))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
