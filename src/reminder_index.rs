// File: ./src/reminder_index.rs
// On-disk mirror of the pending reminders (reminders.json).
//
// The desktop actor keeps its queues in memory; this file lets a restarted
// process re-arm exact reminders and deferred jobs set before it exited.
//
// ⚠️ VERSION BUMP REQUIRED:
// Changes to ReminderIndexEntry or DeferredIndexEntry require incrementing
// INDEX_VERSION. Older versions must stay readable.

use crate::reminder::{DeferredPayload, ExactPayload, ReminderId};
use crate::storage::LocalStorage;
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

// v2: deferred jobs
const INDEX_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderIndexEntry {
    pub id: ReminderId,
    /// Unix timestamp in milliseconds when the reminder should fire
    pub trigger_ms: i64,
    pub payload: ExactPayload,
}

/// A deferred job. Unlike exact entries these are not keyed, duplicates are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeferredIndexEntry {
    /// Unix timestamp in milliseconds after which the job may run
    pub due_ms: i64,
    pub payload: DeferredPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderIndex {
    pub version: u32,
    pub last_updated: i64,
    /// Sorted by trigger_ms, one entry per id
    pub reminders: Vec<ReminderIndexEntry>,
    /// Sorted by due_ms. Missing in v1 files.
    #[serde(default)]
    pub deferred: Vec<DeferredIndexEntry>,
}

impl Default for ReminderIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            last_updated: Utc::now().timestamp(),
            reminders: Vec::new(),
            deferred: Vec::new(),
        }
    }
}

impl ReminderIndex {
    /// Loads the index. Missing, corrupt or outdated files yield an empty index.
    pub fn load(path: &Path) -> Self {
        match LocalStorage::read_json::<ReminderIndex>(path) {
            Ok(Some(index)) if index.version <= INDEX_VERSION => index,
            Ok(Some(index)) => {
                log::warn!(
                    "Discarding reminder index written by a newer version (v{})",
                    index.version
                );
                Self::default()
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Discarding unreadable reminder index: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now().timestamp();
        LocalStorage::write_json(path, self)
    }

    /// Inserts or replaces the entry for `entry.id`.
    pub fn upsert(&mut self, entry: ReminderIndexEntry) {
        self.reminders.retain(|r| r.id != entry.id);
        self.reminders.push(entry);
        self.reminders.sort_by_key(|r| r.trigger_ms);
    }

    pub fn push_deferred(&mut self, entry: DeferredIndexEntry) {
        self.deferred.push(entry);
        // Stable, so jobs due at the same time keep their order
        self.deferred.sort_by_key(|d| d.due_ms);
    }

    /// Drops entries at or before `now_ms`; they have fired (or been missed).
    pub fn prune_fired(&mut self, now_ms: i64) {
        self.reminders.retain(|r| r.trigger_ms > now_ms);
        self.deferred.retain(|d| d.due_ms > now_ms);
    }

    /// Exact and deferred entries together.
    pub fn len(&self) -> usize {
        self.reminders.len() + self.deferred.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty() && self.deferred.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::derive_id;

    fn entry(title: &str, trigger_ms: i64) -> ReminderIndexEntry {
        ReminderIndexEntry {
            id: derive_id(trigger_ms + 600_000, title),
            trigger_ms,
            payload: ExactPayload {
                title: title.to_string(),
                start: "18:00".to_string(),
            },
        }
    }

    #[test]
    fn test_upsert_overwrites_same_id() {
        let mut index = ReminderIndex::default();
        index.upsert(entry("Oppenheimer", 2_000));
        index.upsert(entry("Oppenheimer", 2_000));
        index.upsert(entry("Interstellar", 1_000));

        assert_eq!(index.len(), 2);
        assert_eq!(index.reminders[0].payload.title, "Interstellar");
    }

    fn job(title: &str, due_ms: i64) -> DeferredIndexEntry {
        DeferredIndexEntry {
            due_ms,
            payload: DeferredPayload {
                title: title.to_string(),
                seat: "Row 1, seat 1".to_string(),
                time: "2025-12-24 18:00".to_string(),
            },
        }
    }

    #[test]
    fn test_prune_fired() {
        let mut index = ReminderIndex::default();
        index.upsert(entry("A", 1_000));
        index.upsert(entry("B", 5_000));
        index.push_deferred(job("C", 900));
        index.push_deferred(job("D", 6_000));

        index.prune_fired(1_000);
        assert_eq!(index.len(), 2);
        assert_eq!(index.reminders[0].payload.title, "B");
        assert_eq!(index.deferred[0].payload.title, "D");
        index.prune_fired(6_000);
        assert!(index.is_empty());
    }

    #[test]
    fn test_deferred_jobs_are_not_deduplicated() {
        let mut index = ReminderIndex::default();
        index.push_deferred(job("Oppenheimer", 3_000));
        index.push_deferred(job("Oppenheimer", 3_000));
        index.push_deferred(job("Interstellar", 2_000));

        assert_eq!(index.deferred.len(), 3);
        assert_eq!(index.deferred[0].payload.title, "Interstellar");
    }

    #[test]
    fn test_v1_index_without_deferred_still_loads() {
        let dir = std::env::temp_dir().join(format!("kinopass_index_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reminders.json");
        std::fs::write(
            &path,
            r#"{"version":1,"last_updated":0,"reminders":[{"id":7,"trigger_ms":5000,"payload":{"title":"Dune: Part Two","start":"20:15"}}]}"#,
        )
        .unwrap();

        let index = ReminderIndex::load(&path);
        assert_eq!(index.reminders.len(), 1);
        assert!(index.deferred.is_empty());

        std::fs::write(&path, r#"{"version":99,"last_updated":0,"reminders":[]}"#).unwrap();
        assert!(ReminderIndex::load(&path).is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("kinopass_index_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("reminders.json");

        let mut index = ReminderIndex::default();
        index.upsert(entry("Dune: Part Two", 3_000));
        index.push_deferred(job("John Wick", 4_000));
        index.save(&path).unwrap();

        let loaded = ReminderIndex::load(&path);
        assert_eq!(loaded.reminders, index.reminders);
        assert_eq!(loaded.deferred, index.deferred);

        std::fs::write(&path, "{").unwrap();
        assert!(ReminderIndex::load(&path).is_empty());

        let _ = std::fs::remove_dir_all(dir);
    }
}
