//! In-memory [`StoreAdapter`] used by the explorer tests.
//!
//! Holds a flat keyspace of lists, sorted sets, hashes and strings, serves
//! `scan` in cursor-sized batches to exercise the iteration protocol, and
//! can be told to fail individual keys or the scan itself.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::StoreError;
use super::traits::{KeyKind, StoreAdapter};

#[derive(Debug, Clone)]
pub enum Entry {
    List(Vec<String>),
    // (member, score) pairs kept in score order
    SortedSet(Vec<(String, f64)>),
    Hash(HashMap<String, String>),
    Str(String),
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Entry>>,
    fail_keys: Mutex<HashSet<String>>,
    fail_scan: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&self, key: &str, value: &str) {
        self.insert(key, Entry::Str(value.to_string()));
    }

    pub fn set_list(&self, key: &str, items: &[&str]) {
        self.insert(
            key,
            Entry::List(items.iter().map(|s| s.to_string()).collect()),
        );
    }

    pub fn set_sorted_set(&self, key: &str, members: &[(&str, f64)]) {
        let mut pairs: Vec<(String, f64)> = members
            .iter()
            .map(|(m, s)| (m.to_string(), *s))
            .collect();
        pairs.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        self.insert(key, Entry::SortedSet(pairs));
    }

    pub fn set_hash(&self, key: &str, fields: &[(&str, &str)]) {
        self.insert(
            key,
            Entry::Hash(
                fields
                    .iter()
                    .map(|(f, v)| (f.to_string(), v.to_string()))
                    .collect(),
            ),
        );
    }

    /// Insert a minimal job hash (just enough to look like a job record).
    pub fn set_job_hash(&self, key: &str, name: &str) {
        self.set_hash(key, &[("name", name), ("timestamp", "1700000000000")]);
    }

    /// All operations touching `key` will return `Unavailable`.
    pub fn fail_key(&self, key: &str) {
        self.fail_keys.lock().unwrap().insert(key.to_string());
    }

    /// All `scan` calls will return `Unavailable`.
    pub fn fail_scans(&self) {
        *self.fail_scan.lock().unwrap() = true;
    }

    fn insert(&self, key: &str, entry: Entry) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), entry);
    }

    fn check(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_keys.lock().unwrap().contains(key) {
            return Err(StoreError::Unavailable(format!("injected failure: {key}")));
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Entry> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

/// Resolve a Redis-style inclusive range against a collection length.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = len as isize;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    start = start.max(0);
    stop = stop.min(len - 1);
    if start > stop || len == 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}

/// Minimal glob matcher supporting `*` only, which is all the explorer uses.
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }
    let mut pos = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !text.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == parts.len() - 1 {
            return text.len() >= pos && text[pos..].ends_with(part);
        } else {
            match text[pos..].find(part) {
                Some(idx) => pos += idx + part.len(),
                None => return false,
            }
        }
    }
    true
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> Result<(Vec<String>, u64), StoreError> {
        if *self.fail_scan.lock().unwrap() {
            return Err(StoreError::Unavailable("injected scan failure".into()));
        }
        let matching: Vec<String> = self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        let start = cursor as usize;
        let end = (start + count.max(1)).min(matching.len());
        let batch = matching.get(start..end).unwrap_or_default().to_vec();
        let next = if end >= matching.len() { 0 } else { end as u64 };
        Ok((batch, next))
    }

    async fn key_type(&self, key: &str) -> Result<KeyKind, StoreError> {
        self.check(key)?;
        Ok(match self.get(key) {
            Some(Entry::Hash(_)) => KeyKind::Hash,
            Some(Entry::List(_)) => KeyKind::List,
            Some(Entry::SortedSet(_)) => KeyKind::SortedSet,
            Some(Entry::Str(_)) => KeyKind::String,
            None => KeyKind::None,
        })
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::Hash(fields)) => Ok(fields),
            _ => Ok(HashMap::new()),
        }
    }

    async fn hash_field_exists(&self, key: &str, field: &str) -> Result<bool, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::Hash(fields)) => Ok(fields.contains_key(field)),
            _ => Ok(false),
        }
    }

    async fn list_len(&self, key: &str) -> Result<u64, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::List(items)) => Ok(items.len() as u64),
            _ => Ok(0),
        }
    }

    async fn list_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::List(items)) => Ok(resolve_range(items.len(), start, stop)
                .map(|(a, b)| items[a..=b].to_vec())
                .unwrap_or_default()),
            _ => Ok(Vec::new()),
        }
    }

    async fn list_position(&self, key: &str, value: &str) -> Result<Option<u64>, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::List(items)) => {
                Ok(items.iter().position(|v| v == value).map(|p| p as u64))
            }
            _ => Ok(None),
        }
    }

    async fn sorted_set_card(&self, key: &str) -> Result<u64, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::SortedSet(members)) => Ok(members.len() as u64),
            _ => Ok(0),
        }
    }

    async fn sorted_set_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::SortedSet(members)) => Ok(resolve_range(members.len(), start, stop)
                .map(|(a, b)| members[a..=b].iter().map(|(m, _)| m.clone()).collect())
                .unwrap_or_default()),
            _ => Ok(Vec::new()),
        }
    }

    async fn sorted_set_score(
        &self,
        key: &str,
        member: &str,
    ) -> Result<Option<f64>, StoreError> {
        self.check(key)?;
        match self.get(key) {
            Some(Entry::SortedSet(members)) => Ok(members
                .iter()
                .find(|(m, _)| m == member)
                .map(|(_, score)| *score)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_sentinel_pattern() {
        assert!(glob_match("bull:*:id", "bull:orders:id"));
        assert!(glob_match("bull:*:id", "bull:a:b:id"));
        assert!(!glob_match("bull:*:id", "bull:orders:meta"));
        assert!(!glob_match("bull:*:id", "other:orders:id"));
        assert!(glob_match("bull:orders:*", "bull:orders:17"));
    }

    #[test]
    fn range_resolution_clamps_like_redis() {
        assert_eq!(resolve_range(3, 0, -1), Some((0, 2)));
        assert_eq!(resolve_range(3, 0, 1), Some((0, 1)));
        assert_eq!(resolve_range(3, 0, 99), Some((0, 2)));
        assert_eq!(resolve_range(3, 5, 9), None);
        assert_eq!(resolve_range(0, 0, -1), None);
    }

    #[tokio::test]
    async fn scan_walks_cursor_batches() {
        let store = MemoryStore::new();
        for i in 0..7 {
            store.set_string(&format!("bull:q{i}:id"), "1");
        }
        store.set_string("other:key", "x");

        let mut cursor = 0;
        let mut seen = Vec::new();
        loop {
            let (keys, next) = store.scan(cursor, "bull:*:id", 3).await.unwrap();
            seen.extend(keys);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        assert_eq!(seen.len(), 7);
    }
}
