use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use super::InfraError;
use crate::application::cache::{CacheError, CacheStore, escape_glob};

const SCAN_BATCH: usize = 500;

/// Redis-backed cache store.
#[derive(Clone)]
pub struct RedisCacheStore {
    manager: ConnectionManager,
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let mut manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut manager)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self { manager })
    }
}

fn command_error(e: redis::RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CacheError::Unavailable(e.to_string())
    } else {
        CacheError::Command(e.to_string())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(command_error)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let ttl_secs = ttl.as_secs().max(1);
        let _: () = conn
            .set_ex(key, value, ttl_secs)
            .await
            .map_err(command_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.manager.clone();
        let removed: i64 = conn.del(key).await.map_err(command_error)?;
        Ok(removed > 0)
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.manager.clone();
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;
            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await.map_err(command_error)?;
                removed += count;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        tracing::debug!(prefix, removed, "Deleted cache keys by prefix");
        Ok(removed)
    }
}
