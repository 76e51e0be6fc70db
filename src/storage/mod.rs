//! Store adapter layer.
//!
//! The explorer consumes the external key-value store exclusively through
//! the [`StoreAdapter`] trait. The only production implementation is
//! [`RedisStore`]; tests use an in-memory adapter with scripted failures.

mod error;
mod traits;

pub mod redis;

#[cfg(test)]
pub(crate) mod memory;

pub use error::StoreError;
pub use traits::{KeyKind, StoreAdapter};

pub use redis::{create_redis_pool, create_redis_pool_with_config, RedisPoolConfig, RedisStore};
