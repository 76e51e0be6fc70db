//! The queue/job state classifier and aggregator.
//!
//! This module is the core of the crate: it discovers queue namespaces,
//! computes per-state counts with orphan detection, classifies single
//! jobs, and builds deduplicated cross-state job listings. It is strictly
//! read-only and consumes the store through
//! [`StoreAdapter`](crate::storage::StoreAdapter).

pub mod inspector;
pub mod models;

pub use inspector::{QueueExplorer, StateFilter};
pub use models::{Job, JobState, JobSummary, QueueStats, StateKind, STATE_PRECEDENCE};
