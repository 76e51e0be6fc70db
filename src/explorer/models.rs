//! Data model for the queue explorer.
//!
//! Everything here is a transient view recomputed per request; nothing is
//! persisted or cached. The BullMQ key-space convention is:
//!
//! - `prefix:queue:id` — sentinel key marking a live queue
//! - `prefix:queue:<state>` — one list or sorted set per lifecycle state
//! - `prefix:queue:<jobID>` — one hash per job

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a state collection is physically stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    SortedSet,
}

/// The nine per-queue state collections of the BullMQ schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Wait,
    Active,
    Paused,
    Prioritized,
    WaitingChildren,
    Failed,
    Completed,
    Delayed,
    Stalled,
}

impl StateKind {
    /// Key suffix under `prefix:queue:`.
    pub fn key_suffix(self) -> &'static str {
        match self {
            StateKind::Wait => "wait",
            StateKind::Active => "active",
            StateKind::Paused => "paused",
            StateKind::Prioritized => "prioritized",
            StateKind::WaitingChildren => "waiting-children",
            StateKind::Failed => "failed",
            StateKind::Completed => "completed",
            StateKind::Delayed => "delayed",
            StateKind::Stalled => "stalled",
        }
    }

    pub fn collection(self) -> CollectionKind {
        match self {
            StateKind::Wait | StateKind::Active | StateKind::Paused => CollectionKind::List,
            _ => CollectionKind::SortedSet,
        }
    }

    /// The lifecycle state a membership in this collection implies.
    pub fn as_state(self) -> JobState {
        match self {
            StateKind::Wait => JobState::Waiting,
            StateKind::Active => JobState::Active,
            StateKind::Paused => JobState::Paused,
            StateKind::Prioritized => JobState::Prioritized,
            StateKind::WaitingChildren => JobState::WaitingChildren,
            StateKind::Failed => JobState::Failed,
            StateKind::Completed => JobState::Completed,
            StateKind::Delayed => JobState::Delayed,
            StateKind::Stalled => JobState::Stalled,
        }
    }

    /// Parse the user-facing state name used in listings and URLs.
    pub fn from_name(name: &str) -> Option<StateKind> {
        Some(match name {
            "waiting" | "wait" => StateKind::Wait,
            "active" => StateKind::Active,
            "paused" => StateKind::Paused,
            "prioritized" => StateKind::Prioritized,
            "waiting-children" => StateKind::WaitingChildren,
            "failed" => StateKind::Failed,
            "completed" => StateKind::Completed,
            "delayed" => StateKind::Delayed,
            "stalled" => StateKind::Stalled,
            _ => return None,
        })
    }
}

/// Fixed precedence used both to classify a single job and to attribute a
/// job to a state during cross-state aggregation. When a job ID transiently
/// appears in two collections at once, the earlier entry wins; this is a
/// deterministic tie-break, not an error.
pub const STATE_PRECEDENCE: [StateKind; 9] = [
    StateKind::Active,
    StateKind::Wait,
    StateKind::Paused,
    StateKind::Prioritized,
    StateKind::WaitingChildren,
    StateKind::Failed,
    StateKind::Completed,
    StateKind::Delayed,
    StateKind::Stalled,
];

/// Key suffixes that are never job hashes: the sentinel, queue metadata,
/// and the state collections themselves. Skipped by the orphan scan.
pub const METADATA_SUFFIXES: [&str; 13] = [
    "id",
    "meta",
    "events",
    "wait",
    "active",
    "failed",
    "completed",
    "delayed",
    "stalled",
    "paused",
    "priority",
    "prioritized",
    "waiting-children",
];

/// Derived lifecycle state of a job. Never stored on the record itself;
/// always recomputed from current collection membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobState {
    Waiting,
    Active,
    Paused,
    Prioritized,
    WaitingChildren,
    Failed,
    Completed,
    Delayed,
    Stalled,
    /// The job hash exists but no collection references its ID.
    Unknown,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Active => "active",
            JobState::Paused => "paused",
            JobState::Prioritized => "prioritized",
            JobState::WaitingChildren => "waiting-children",
            JobState::Failed => "failed",
            JobState::Completed => "completed",
            JobState::Delayed => "delayed",
            JobState::Stalled => "stalled",
            JobState::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-queue aggregate counts.
///
/// Invariant: `total` equals the sum of the nine state counts plus
/// `orphaned`, and `orphaned` is never negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStats {
    pub name: String,
    pub wait: u64,
    pub active: u64,
    pub paused: u64,
    pub prioritized: u64,
    pub waiting_children: u64,
    pub failed: u64,
    pub completed: u64,
    pub delayed: u64,
    pub stalled: u64,
    /// Job hashes referenced by no state collection.
    pub orphaned: u64,
    pub total: u64,
}

impl QueueStats {
    pub fn count(&self, kind: StateKind) -> u64 {
        match kind {
            StateKind::Wait => self.wait,
            StateKind::Active => self.active,
            StateKind::Paused => self.paused,
            StateKind::Prioritized => self.prioritized,
            StateKind::WaitingChildren => self.waiting_children,
            StateKind::Failed => self.failed,
            StateKind::Completed => self.completed,
            StateKind::Delayed => self.delayed,
            StateKind::Stalled => self.stalled,
        }
    }

    pub(crate) fn set_count(&mut self, kind: StateKind, value: u64) {
        match kind {
            StateKind::Wait => self.wait = value,
            StateKind::Active => self.active = value,
            StateKind::Paused => self.paused = value,
            StateKind::Prioritized => self.prioritized = value,
            StateKind::WaitingChildren => self.waiting_children = value,
            StateKind::Failed => self.failed = value,
            StateKind::Completed => self.completed = value,
            StateKind::Delayed => self.delayed = value,
            StateKind::Stalled => self.stalled = value,
        }
    }

    pub fn state_sum(&self) -> u64 {
        STATE_PRECEDENCE.iter().map(|k| self.count(*k)).sum()
    }
}

/// A fully decoded job hash, field names matching what BullMQ writes.
///
/// Structured fields that fail to parse are left at their zero value; a
/// producer writing a schema-incompatible payload must not hide the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub queue: String,
    pub name: String,
    pub data: Value,
    pub opts: Value,
    pub progress: Value,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    #[serde(rename = "attemptsMade")]
    pub attempts_made: u32,
    #[serde(rename = "failedReason")]
    pub failed_reason: String,
    pub stacktrace: Vec<String>,
    #[serde(rename = "returnvalue")]
    pub return_value: Value,
    #[serde(rename = "finishedOn")]
    pub finished_on: i64,
    #[serde(rename = "processedOn")]
    pub processed_on: i64,
    /// Derived from current collection membership, never from the hash.
    pub state: JobState,
}

impl Job {
    pub fn empty(queue: &str, id: &str) -> Self {
        Job {
            id: id.to_string(),
            queue: queue.to_string(),
            name: String::new(),
            data: Value::Null,
            opts: Value::Null,
            progress: Value::Null,
            timestamp: 0,
            attempts_made: 0,
            failed_reason: String::new(),
            stacktrace: Vec::new(),
            return_value: Value::Null,
            finished_on: 0,
            processed_on: 0,
            state: JobState::Unknown,
        }
    }
}

/// Lighter-weight projection of [`Job`] used for list views and search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub state: JobState,
    pub queue: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "attemptsMade")]
    pub attempts_made: u32,
    pub data: String,
    pub opts: String,
    #[serde(rename = "failedReason")]
    pub failed_reason: String,
}

/// `prefix:queue:suffix`
pub fn queue_key(prefix: &str, queue: &str, suffix: &str) -> String {
    format!("{prefix}:{queue}:{suffix}")
}

/// Pattern matching every queue's sentinel key.
pub fn sentinel_pattern(prefix: &str) -> String {
    format!("{prefix}:*:id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_starts_with_active_and_covers_all_nine() {
        assert_eq!(STATE_PRECEDENCE[0], StateKind::Active);
        assert_eq!(STATE_PRECEDENCE.len(), 9);
        // failed must precede completed for the tie-break rule
        let failed = STATE_PRECEDENCE
            .iter()
            .position(|k| *k == StateKind::Failed)
            .unwrap();
        let completed = STATE_PRECEDENCE
            .iter()
            .position(|k| *k == StateKind::Completed)
            .unwrap();
        assert!(failed < completed);
    }

    #[test]
    fn state_names_round_trip() {
        for kind in STATE_PRECEDENCE {
            let name = kind.as_state().as_str();
            assert_eq!(StateKind::from_name(name), Some(kind));
        }
        assert_eq!(StateKind::from_name("nope"), None);
    }

    #[test]
    fn key_suffixes_are_all_listed_as_metadata() {
        for kind in STATE_PRECEDENCE {
            assert!(METADATA_SUFFIXES.contains(&kind.key_suffix()));
        }
    }

    #[test]
    fn job_state_serializes_kebab_case() {
        let json = serde_json::to_string(&JobState::WaitingChildren).unwrap();
        assert_eq!(json, "\"waiting-children\"");
    }
}
