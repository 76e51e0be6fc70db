//! Redis-backed [`StoreAdapter`] implementation.
//!
//! Every method is a thin wrapper over a single Redis command executed on
//! a pooled connection; no command here ever writes.

pub mod pool;

use std::collections::HashMap;

use async_trait::async_trait;
use bb8_redis::bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;

use super::error::StoreError;
use super::traits::{KeyKind, StoreAdapter};

pub use pool::{create_redis_pool, create_redis_pool_with_config, RedisPoolConfig};

/// Production store adapter over a bb8 Redis pool.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisStore {
    pub fn new(pool: Pool<RedisConnectionManager>) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Unavailable(format!("failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl StoreAdapter for RedisStore {
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(Vec<String>, u64), StoreError> {
        let mut conn = self.conn().await?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut *conn)
            .await?;
        Ok((keys, next))
    }

    async fn key_type(&self, key: &str) -> Result<KeyKind, StoreError> {
        let mut conn = self.conn().await?;
        let name: String = redis::cmd("TYPE").arg(key).query_async(&mut *conn).await?;
        Ok(KeyKind::from_type_name(&name))
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.hexists(key, field).await?;
        Ok(exists)
    }

    async fn list_len(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        let items: Vec<String> = conn.lrange(key, start, stop).await?;
        Ok(items)
    }

    async fn list_position(&self, key: &str, value: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn().await?;
        let pos: Option<u64> = redis::cmd("LPOS")
            .arg(key)
            .arg(value)
            .query_async(&mut *conn)
            .await?;
        Ok(pos)
    }

    async fn sorted_set_card(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let card: u64 = conn.zcard(key).await?;
        Ok(card)
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        let members: Vec<String> = conn.zrange(key, start, stop).await?;
        Ok(members)
    }

    async fn sorted_set_score(
        &self,
        key: &str,
        member: &str,
    ) -> Result<Option<f64>, StoreError> {
        let mut conn = self.conn().await?;
        let score: Option<f64> = conn.zscore(key, member).await?;
        Ok(score)
    }
}
