use async_trait::async_trait;
use minilink_core::cache::{AliasCache, Result};
use minilink_core::{Alias, CacheError, NormalizedUrl};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Key prefix used by [`RedisAliasCache::new`].
pub const DEFAULT_KEY_PREFIX: &str = "minilink:alias:";

/// A Redis-based implementation of [`AliasCache`].
///
/// URLs are stored as plain strings under `<prefix><alias>` and expire through
/// Redis' own `EX` TTL.
#[derive(Clone)]
pub struct RedisAliasCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

impl std::fmt::Debug for RedisAliasCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisAliasCache")
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisAliasCache {
    /// Creates a cache using [`DEFAULT_KEY_PREFIX`].
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self::with_prefix(conn, DEFAULT_KEY_PREFIX)
    }

    /// Creates a cache with a custom key prefix (e.g. `"myapp:alias:"`).
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Opens a multiplexed connection to `redis_url` and wraps it.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            CacheError::Initialization(format!("invalid redis url '{redis_url}': {e}"))
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;
        Ok(Self::with_prefix(conn, key_prefix))
    }

    fn cache_key(&self, alias: &Alias) -> String {
        format!("{}{}", self.key_prefix, alias.as_str())
    }
}

#[async_trait]
impl AliasCache for RedisAliasCache {
    async fn get(&self, alias: &Alias) -> Result<Option<NormalizedUrl>> {
        let key = self.cache_key(alias);
        trace!(alias = %alias, "Fetching URL from Redis cache");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(url)) if url.is_empty() => {
                warn!(alias = %alias, "Empty value cached in Redis");
                Err(CacheError::InvalidData(format!(
                    "empty cached value for key '{key}'"
                )))
            }
            Ok(Some(url)) => {
                debug!(alias = %alias, "Cache hit in Redis");
                Ok(Some(NormalizedUrl::new_unchecked(url)))
            }
            Ok(None) => {
                trace!(alias = %alias, "Cache miss in Redis");
                Ok(None)
            }
            Err(e) => {
                warn!(alias = %alias, error = %e, "Redis error on get");
                Err(map_redis_error("failed to fetch value from Redis", e))
            }
        }
    }

    async fn set(&self, alias: &Alias, url: &NormalizedUrl, ttl: Duration) -> Result<()> {
        // Redis rejects `EX 0`.
        let seconds = ttl.as_secs();
        if seconds == 0 {
            trace!(alias = %alias, "Zero TTL, dropping cached URL instead");
            return self.del(alias).await;
        }

        let key = self.cache_key(alias);
        trace!(alias = %alias, ttl_secs = seconds, "Storing URL in Redis cache");

        let mut conn = self.conn.clone();
        match conn.set_ex::<_, _, ()>(&key, url.as_str(), seconds).await {
            Ok(()) => {
                debug!(alias = %alias, "Cached URL in Redis");
                Ok(())
            }
            Err(e) => {
                warn!(alias = %alias, error = %e, "Failed to cache URL in Redis");
                Err(map_redis_error("failed to write value to Redis", e))
            }
        }
    }

    async fn del(&self, alias: &Alias) -> Result<()> {
        let key = self.cache_key(alias);
        trace!(alias = %alias, "Removing URL from Redis cache");

        let mut conn = self.conn.clone();
        match conn.del::<_, ()>(&key).await {
            Ok(()) => {
                debug!(alias = %alias, "Removed URL from Redis cache");
                Ok(())
            }
            Err(e) => {
                warn!(alias = %alias, error = %e, "Failed to remove URL from Redis cache");
                Err(map_redis_error("failed to delete value from Redis", e))
            }
        }
    }
}
