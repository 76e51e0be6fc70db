//! Read-only explorer over the BullMQ key-space.
//!
//! [`QueueExplorer`] is stateless: every operation is a sequence of
//! independent store reads followed by in-memory aggregation. Reads within
//! one operation may observe different instants of the store; that read
//! skew is accepted for a monitoring view. Failure policy per operation:
//!
//! - discovery: a scan error aborts and propagates, no partial queue set;
//! - stats: every sub-read degrades to zero independently;
//! - job loads: a missing hash is a typed not-found, a malformed field is
//!   left at its zero value, a job that fails to load mid-listing is
//!   skipped.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::DateTime;
use serde_json::Value;

use crate::metrics;
use crate::storage::{KeyKind, StoreAdapter, StoreError};

use super::models::{
    queue_key, sentinel_pattern, CollectionKind, Job, JobState, JobSummary, QueueStats,
    StateKind, METADATA_SUFFIXES, STATE_PRECEDENCE,
};

/// Batch-size hint for the orphan-detection key-space sweep.
const SCAN_BATCH: usize = 100;
/// Batch-size hint for sentinel discovery.
const DISCOVERY_BATCH: usize = 10;

/// State selector for job listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    /// Iterate all nine states in precedence order, deduplicating by ID.
    All,
    One(StateKind),
}

impl StateFilter {
    pub fn parse(name: &str) -> Option<StateFilter> {
        if name == "all" {
            return Some(StateFilter::All);
        }
        StateKind::from_name(name).map(StateFilter::One)
    }
}

/// Read-only view over every queue sharing a key prefix.
#[derive(Clone)]
pub struct QueueExplorer {
    store: Arc<dyn StoreAdapter>,
    prefix: String,
}

impl QueueExplorer {
    pub fn new(store: Arc<dyn StoreAdapter>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, queue: &str, suffix: &str) -> String {
        queue_key(&self.prefix, queue, suffix)
    }

    /// Enumerate queue namespaces by scanning for `prefix:*:id` sentinel
    /// keys. Returns a deduplicated, sorted list; empty when none exist.
    ///
    /// A scan error aborts the whole discovery: downstream aggregation must
    /// never run against a half-enumerated queue set. Queues that never
    /// assigned a job ID have no sentinel and stay invisible.
    pub async fn discover_queues(&self) -> Result<Vec<String>, StoreError> {
        let _timer = op_timer("discover_queues");
        let pattern = sentinel_pattern(&self.prefix);
        let mut names = BTreeSet::new();
        let mut cursor = 0u64;
        loop {
            let (keys, next) = self
                .store
                .scan(cursor, &pattern, DISCOVERY_BATCH)
                .await
                .inspect_err(|_| record_error("discover_queues"))?;
            for key in keys {
                // Key format: "bull:my-queue-name:id"
                let mut parts = key.split(':');
                if let (Some(_), Some(queue), Some(_)) = (parts.next(), parts.next(), parts.next())
                {
                    names.insert(queue.to_string());
                }
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Compute stats for each queue in turn. Per-queue computation is
    /// best-effort and always yields a row, so a flaky collection never
    /// blanks the dashboard.
    pub async fn stats_for(&self, queues: &[String]) -> Vec<QueueStats> {
        let mut all = Vec::with_capacity(queues.len());
        for queue in queues {
            all.push(self.queue_stats(queue).await);
        }
        all
    }

    /// Per-state counts plus orphan detection for one queue.
    ///
    /// Each of the nine collection reads is issued independently and
    /// degrades to zero on failure. The result also refreshes the
    /// per-queue gauge set.
    pub async fn queue_stats(&self, queue: &str) -> QueueStats {
        let _timer = op_timer("get_queue_stats");
        let mut stats = QueueStats {
            name: queue.to_string(),
            ..Default::default()
        };

        for kind in STATE_PRECEDENCE {
            stats.set_count(kind, self.collection_count(queue, kind).await);
        }

        let referenced = self.referenced_ids(queue).await;
        let job_hashes = self.count_job_hashes(queue).await;
        stats.orphaned = job_hashes.saturating_sub(referenced.len() as u64);
        stats.total = stats.state_sum() + stats.orphaned;

        metrics::record_queue_stats(&stats);
        stats
    }

    /// Size of one state collection, zero on read failure.
    async fn collection_count(&self, queue: &str, kind: StateKind) -> u64 {
        let key = self.key(queue, kind.key_suffix());
        let result = match kind.collection() {
            CollectionKind::List => self.store.list_len(&key).await,
            CollectionKind::SortedSet => self.store.sorted_set_card(&key).await,
        };
        match result {
            Ok(count) => count,
            Err(e) => {
                record_error("get_queue_stats");
                tracing::warn!(queue, state = kind.key_suffix(), error = %e,
                    "collection count degraded to zero");
                0
            }
        }
    }

    /// Union of every job ID referenced by any of the nine collections.
    /// A collection that fails to read contributes nothing.
    async fn referenced_ids(&self, queue: &str) -> HashSet<String> {
        let mut ids = HashSet::new();
        for kind in STATE_PRECEDENCE {
            let key = self.key(queue, kind.key_suffix());
            let members = match kind.collection() {
                CollectionKind::List => self.store.list_range(&key, 0, -1).await,
                CollectionKind::SortedSet => self.store.sorted_set_range(&key, 0, -1).await,
            };
            match members {
                Ok(members) => ids.extend(members),
                Err(e) => {
                    record_error("get_queue_stats");
                    tracing::warn!(queue, state = kind.key_suffix(), error = %e,
                        "membership read skipped");
                }
            }
        }
        ids
    }

    /// Count job hashes under `prefix:queue:*` via a full cursor sweep,
    /// skipping metadata/state keys and anything that is not a hash with a
    /// `name` field. This is O(key-space) per call; the store offers no
    /// index for "hashes in no collection".
    async fn count_job_hashes(&self, queue: &str) -> u64 {
        let stem = format!("{}:{}:", self.prefix, queue);
        let pattern = format!("{stem}*");
        let mut total = 0u64;
        let mut cursor = 0u64;
        loop {
            let (keys, next) = match self.store.scan(cursor, &pattern, SCAN_BATCH).await {
                Ok(v) => v,
                Err(e) => {
                    record_error("get_queue_stats");
                    tracing::warn!(queue, error = %e, "job hash sweep aborted early");
                    break;
                }
            };
            for key in keys {
                let Some(suffix) = key.strip_prefix(&stem) else {
                    continue;
                };
                if METADATA_SUFFIXES.contains(&suffix) {
                    continue;
                }
                match self.store.key_type(&key).await {
                    Ok(KeyKind::Hash) => {}
                    _ => continue,
                }
                // Structural signature of a job record
                if matches!(self.store.hash_field_exists(&key, "name").await, Ok(true)) {
                    total += 1;
                }
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        total
    }

    /// Load and decode one job hash.
    ///
    /// An empty hash yields [`StoreError::NotFound`]. Structured fields
    /// that fail to parse are left at their zero values and the record is
    /// still returned. The returned state is classified live.
    pub async fn get_job(&self, queue: &str, job_id: &str) -> Result<Job, StoreError> {
        let _timer = op_timer("get_job");
        let key = self.key(queue, job_id);
        let fields = self
            .store
            .hash_get_all(&key)
            .await
            .inspect_err(|_| record_error("get_job"))?;
        if fields.is_empty() {
            return Err(StoreError::NotFound(format!("job not found: {job_id}")));
        }

        let mut job = Job::empty(queue, job_id);
        if let Some(name) = fields.get("name") {
            job.name = name.clone();
        }
        job.data = json_field(&fields, "data");
        job.opts = json_field(&fields, "opts");
        job.progress = json_field(&fields, "progress");
        job.timestamp = int_field(&fields, "timestamp");
        job.attempts_made = int_field(&fields, "attemptsMade").max(0) as u32;
        if let Some(reason) = fields.get("failedReason") {
            job.failed_reason = reason.clone();
        }
        job.stacktrace = fields
            .get("stacktrace")
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        job.return_value = json_field(&fields, "returnvalue");
        job.finished_on = int_field(&fields, "finishedOn");
        job.processed_on = int_field(&fields, "processedOn");

        job.state = self.classify(queue, job_id).await;
        Ok(job)
    }

    /// Determine the single lifecycle state a job currently occupies by
    /// probing collections in [`STATE_PRECEDENCE`] order; the first
    /// membership wins, `unknown` when none match. A probe error counts as
    /// "not a member".
    pub async fn classify(&self, queue: &str, job_id: &str) -> JobState {
        for kind in STATE_PRECEDENCE {
            let key = self.key(queue, kind.key_suffix());
            let member = match kind.collection() {
                CollectionKind::List => {
                    matches!(self.store.list_position(&key, job_id).await, Ok(Some(_)))
                }
                CollectionKind::SortedSet => {
                    matches!(self.store.sorted_set_score(&key, job_id).await, Ok(Some(_)))
                }
            };
            if member {
                return kind.as_state();
            }
        }
        JobState::Unknown
    }

    /// Up to `limit` job summaries from one state collection, in the
    /// collection's natural order (list order, or ascending score).
    /// Jobs that fail to load are skipped.
    pub async fn jobs_by_state(
        &self,
        queue: &str,
        kind: StateKind,
        limit: usize,
    ) -> Result<Vec<JobSummary>, StoreError> {
        let _timer = op_timer("get_jobs_by_state");
        if limit == 0 {
            return Ok(Vec::new());
        }
        let key = self.key(queue, kind.key_suffix());
        let stop = limit as isize - 1;
        let ids = match kind.collection() {
            CollectionKind::List => self.store.list_range(&key, 0, stop).await,
            CollectionKind::SortedSet => self.store.sorted_set_range(&key, 0, stop).await,
        }
        .inspect_err(|_| record_error("get_jobs_by_state"))?;

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_job(queue, &id).await {
                Ok(job) => summaries.push(summarize(job, kind)),
                Err(e) => {
                    tracing::debug!(queue, job_id = %id, error = %e,
                        "skipping job that failed to load");
                }
            }
        }
        Ok(summaries)
    }

    /// Deduplicated job listing across one state or all nine, with an
    /// optional case-insensitive substring search over ID, name, data,
    /// opts and failedReason.
    ///
    /// In `All` mode each state contributes at most `limit` raw candidates
    /// before filtering (advisory per-state pagination, not a global
    /// top-K), and a state whose listing fails is skipped rather than
    /// aborting the rest.
    pub async fn list_jobs(
        &self,
        queue: &str,
        filter: StateFilter,
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<JobSummary>, StoreError> {
        let kinds: &[StateKind] = match filter {
            StateFilter::One(ref kind) => std::slice::from_ref(kind),
            StateFilter::All => &STATE_PRECEDENCE,
        };
        let needle = query
            .map(|q| q.to_lowercase())
            .filter(|q| !q.is_empty());

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for kind in kinds {
            let summaries = match self.jobs_by_state(queue, *kind, limit).await {
                Ok(summaries) => summaries,
                Err(e) if matches!(filter, StateFilter::All) => {
                    tracing::warn!(queue, state = kind.key_suffix(), error = %e,
                        "state listing skipped in cross-state aggregation");
                    continue;
                }
                Err(e) => return Err(e),
            };
            for summary in summaries {
                // First occurrence in precedence order owns the summary
                if !seen.insert(summary.id.clone()) {
                    continue;
                }
                if let Some(ref needle) = needle {
                    if !summary_matches(&summary, needle) {
                        continue;
                    }
                }
                out.push(summary);
            }
        }
        Ok(out)
    }
}

fn op_timer(op: &str) -> prometheus::HistogramTimer {
    metrics::STORE_OP_DURATION
        .with_label_values(&[op])
        .start_timer()
}

fn record_error(op: &str) {
    metrics::STORE_OP_ERRORS.with_label_values(&[op]).inc();
}

fn json_field(fields: &HashMap<String, String>, name: &str) -> Value {
    fields
        .get(name)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null)
}

fn int_field(fields: &HashMap<String, String>, name: &str) -> i64 {
    fields
        .get(name)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}

fn summarize(job: Job, requested: StateKind) -> JobSummary {
    let state = if job.state == JobState::Unknown {
        requested.as_state()
    } else {
        job.state
    };
    JobSummary {
        id: job.id,
        name: job.name,
        state,
        queue: job.queue,
        timestamp: DateTime::from_timestamp_millis(job.timestamp)
            .unwrap_or(DateTime::UNIX_EPOCH),
        attempts_made: job.attempts_made,
        data: stringify(&job.data),
        opts: stringify(&job.opts),
        failed_reason: job.failed_reason,
    }
}

fn stringify(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

fn summary_matches(summary: &JobSummary, needle_lower: &str) -> bool {
    [
        &summary.id,
        &summary.name,
        &summary.data,
        &summary.opts,
        &summary.failed_reason,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle_lower))
}
