//! Error types for store adapters.
//!
//! Every adapter maps its internal errors onto [`StoreError`] so the
//! explorer can treat fatal connectivity problems, typed not-found
//! signals, and local parse failures uniformly.

use thiserror::Error;

/// Errors surfaced by a [`StoreAdapter`](super::StoreAdapter).
///
/// The explorer distinguishes three tiers:
///
/// - [`StoreError::Unavailable`] is fatal for the request that hit it and
///   propagates unchanged.
/// - [`StoreError::NotFound`] is a typed signal ("this job has no hash"),
///   distinguishable from connectivity loss.
/// - Everything else is absorbed at the smallest unit of work by the
///   explorer's best-effort policy.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store is unreachable (connection lost, pool exhausted, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration (bad URL, zero-sized pool, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Anything else that went wrong inside the adapter.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True when the error indicates the record simply does not exist,
    /// as opposed to the store being broken.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
