//! The capability surface the explorer consumes from the key-value store.
//!
//! The explorer never talks to Redis directly; it only uses the narrow,
//! read-only [`StoreAdapter`] trait defined here. The production adapter is
//! [`RedisStore`](super::redis::RedisStore); tests supply an in-memory one.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StoreError;

/// The data structure a key holds, as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Hash,
    List,
    SortedSet,
    String,
    /// The key does not exist.
    None,
    /// Any other structure (stream, set, ...).
    Other,
}

impl KeyKind {
    /// Parse the response of a Redis `TYPE` command.
    pub fn from_type_name(name: &str) -> KeyKind {
        match name {
            "hash" => KeyKind::Hash,
            "list" => KeyKind::List,
            "zset" => KeyKind::SortedSet,
            "string" => KeyKind::String,
            "none" => KeyKind::None,
            _ => KeyKind::Other,
        }
    }
}

/// Read-only capability interface over the external key-value store.
///
/// All operations map 1:1 onto Redis commands; the contract below is what
/// the explorer relies on, independent of the backing implementation.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    /// One step of cursor-based key iteration (`SCAN`).
    ///
    /// Start with `cursor = 0`; iteration is complete when the returned
    /// cursor is `0` again. `count` is a batch-size hint, not a guarantee.
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(Vec<String>, u64), StoreError>;

    /// The structure stored at `key` (`TYPE`).
    async fn key_type(&self, key: &str) -> Result<KeyKind, StoreError>;

    /// All fields of a hash (`HGETALL`). Missing keys yield an empty map.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Whether a hash has the given field (`HEXISTS`).
    async fn hash_field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError>;

    /// Length of a list (`LLEN`). Missing keys yield `0`.
    async fn list_len(&self, key: &str) -> Result<u64, StoreError>;

    /// Inclusive slice of a list (`LRANGE`). Negative indexes count from
    /// the tail, Redis-style.
    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError>;

    /// Position of the first occurrence of `value` in a list (`LPOS`),
    /// or `None` when the list does not contain it.
    async fn list_position(&self, key: &str, value: &str) -> Result<Option<u64>, StoreError>;

    /// Cardinality of a sorted set (`ZCARD`). Missing keys yield `0`.
    async fn sorted_set_card(&self, key: &str) -> Result<u64, StoreError>;

    /// Inclusive slice of a sorted set in ascending score order (`ZRANGE`).
    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError>;

    /// Score of a member (`ZSCORE`), or `None` when absent.
    async fn sorted_set_score(&self, key: &str, member: &str)
        -> Result<Option<f64>, StoreError>;
}
