//! bullwatch — a read-only dashboard and Prometheus exporter for
//! BullMQ-style job queues stored in Redis/Valkey.
//!
//! The crate never enqueues, retries or mutates jobs; it only derives
//! human-readable state from the queue library's key-space: which queues
//! exist, how many jobs sit in each lifecycle state, which jobs are
//! orphaned, and the details of individual jobs.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bullwatch::explorer::QueueExplorer;
//! use bullwatch::storage::{create_redis_pool, RedisStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_redis_pool("redis://127.0.0.1:6379").await?;
//! let explorer = QueueExplorer::new(Arc::new(RedisStore::new(pool)), "bull");
//!
//! let queues = explorer.discover_queues().await?;
//! for stats in explorer.stats_for(&queues).await {
//!     println!("{}: {} jobs ({} orphaned)", stats.name, stats.total, stats.orphaned);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod explorer;
pub mod metrics;
pub mod storage;
pub mod web;

pub use config::Config;
pub use explorer::{Job, JobState, JobSummary, QueueExplorer, QueueStats, StateFilter};
pub use storage::{StoreAdapter, StoreError};
