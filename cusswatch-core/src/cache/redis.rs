use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

use super::Cache;

/// Redis-backed cache for multi-instance deployments. Failures degrade to
/// misses/dropped writes so an unavailable Redis never fails a pipeline run.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        info!("Connecting to Redis cache at {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Successfully connected to Redis cache");

        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
        {
            Ok(Some(value)) => {
                debug!("Cache HIT: {}", key);
                Some(value)
            }
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(err) => {
                warn!(key, %err, "Redis GET failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        let mut conn = self.conn.clone();
        let result = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<()>(&mut conn)
            .await;

        if let Err(err) = result {
            warn!(key, %err, "Redis SET failed, dropping write");
        }
    }
}
