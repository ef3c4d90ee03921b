use std::time::Duration;

use async_trait::async_trait;
use keyhole_core::{CacheError, CacheStore};
use redis::AsyncCommands;
use tracing::trace;

/// A Redis-backed [`CacheStore`].
///
/// Values are stored as raw byte strings under caller-supplied keys.
/// The multiplexed connection is cheap to clone per operation and
/// reconnects on its own; every fault is reported to the caller, who
/// decides whether it may be swallowed.
#[derive(Debug, Clone)]
pub struct RedisCacheStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisCacheStore {
    /// Creates a cache store over an existing multiplexed connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }

    /// Connects to the given Redis URL and wraps the connection.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url).map_err(map_redis_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(Self::new(conn))
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    let message = err.to_string();
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        trace!(key, "redis GET");
        let mut conn = self.conn.clone();
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        trace!(key, ttl_secs = ttl.as_secs(), "redis SET");
        let mut conn = self.conn.clone();
        if ttl.is_zero() {
            conn.set::<_, _, ()>(key, value).await.map_err(map_redis_error)
        } else {
            conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(map_redis_error)
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        trace!(key, "redis DEL");
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }
}

// Behavior against a live server is covered by tests/redis_cache_integration.rs.
