//! Continue-watching history, persisted as a human-inspectable JSON array.
//!
//! The file mirrors what the original web client kept in local storage:
//! one object per `(code, ep)` pair, newest first, capped at 50 entries.
//! A missing or corrupt file degrades to an empty history, never to a
//! failed session.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::common::types::{ContentCode, Language, now_ms};

/// Most recent entries kept; older ones are evicted on upsert.
pub const CONTINUE_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueEntry {
    pub code: ContentCode,
    pub ep: u32,
    /// Playback position in seconds.
    #[serde(default)]
    pub time: f64,
    /// Known duration in seconds, 0.0 when the element never reported one.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub lang: Option<Language>,
    /// Unix milliseconds of the last write; list order key.
    #[serde(default)]
    pub updated_at: u64,
}

impl ContinueEntry {
    /// Merge `newer` over `self`: new values win, absent metadata keeps
    /// whatever was already recorded.
    fn merge_from(&mut self, newer: ContinueEntry) {
        self.time = newer.time;
        self.duration = newer.duration;
        self.updated_at = newer.updated_at;
        if newer.title.is_some() {
            self.title = newer.title;
        }
        if newer.cover.is_some() {
            self.cover = newer.cover;
        }
        if newer.lang.is_some() {
            self.lang = newer.lang;
        }
    }
}

pub struct ContinueStore {
    path: PathBuf,
    entries: Mutex<Vec<ContinueEntry>>,
}

impl ContinueStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load_from(path: &Path) -> Vec<ContinueEntry> {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Vec<ContinueEntry>>(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!("Continue-watching file {:?} is corrupt ({}), starting empty", path, e);
                Vec::new()
            }
        }
    }

    /// Insert or update by `(code, ep)`, stamp `updated_at`, re-sort newest
    /// first and evict beyond the cap.
    pub fn upsert(&self, mut entry: ContinueEntry) {
        entry.updated_at = now_ms();

        let mut entries = self.entries.lock();
        match entries
            .iter_mut()
            .find(|e| e.code == entry.code && e.ep == entry.ep)
        {
            Some(existing) => existing.merge_from(entry),
            None => entries.insert(0, entry),
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries.truncate(CONTINUE_CAP);
        self.persist(&entries);
    }

    /// Snapshot ordered by `updated_at` descending.
    pub fn list(&self) -> Vec<ContinueEntry> {
        self.entries.lock().clone()
    }

    pub fn find(&self, code: &ContentCode, ep: u32) -> Option<ContinueEntry> {
        self.entries
            .lock()
            .iter()
            .find(|e| &e.code == code && e.ep == ep)
            .cloned()
    }

    /// Most recently watched episode of a title, for "continue this title".
    pub fn find_latest(&self, code: &ContentCode) -> Option<ContinueEntry> {
        self.entries
            .lock()
            .iter()
            .find(|e| &e.code == code)
            .cloned()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.persist(&entries);
    }

    fn persist(&self, entries: &[ContinueEntry]) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize continue-watching list: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!("Failed to write {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, ep: u32, time: f64) -> ContinueEntry {
        ContinueEntry {
            code: code.into(),
            ep,
            time,
            duration: 120.0,
            title: Some(format!("Title {code}")),
            cover: None,
            lang: Some("en".into()),
            updated_at: 0,
        }
    }

    fn temp_store() -> (tempfile::TempDir, ContinueStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ContinueStore::open(dir.path().join("continue.json"));
        (dir, store)
    }

    #[test]
    fn upsert_is_idempotent_per_key() {
        let (_dir, store) = temp_store();

        store.upsert(entry("ABC123", 1, 10.0));
        store.upsert(entry("ABC123", 1, 42.0));

        let list = store.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].time, 42.0);
    }

    #[test]
    fn merge_keeps_old_metadata_when_new_is_absent() {
        let (_dir, store) = temp_store();

        store.upsert(entry("ABC123", 1, 10.0));
        store.upsert(ContinueEntry {
            title: None,
            cover: None,
            lang: None,
            ..entry("ABC123", 1, 55.0)
        });

        let found = store.find(&"ABC123".into(), 1).unwrap();
        assert_eq!(found.time, 55.0);
        assert_eq!(found.title.as_deref(), Some("Title ABC123"));
    }

    #[test]
    fn list_is_sorted_and_capped_at_fifty() {
        let (_dir, store) = temp_store();

        for i in 0..100u32 {
            store.upsert(entry(&format!("C{i}"), 1, i as f64));
        }

        let list = store.list();
        assert_eq!(list.len(), CONTINUE_CAP);
        assert!(
            list.windows(2).all(|w| w[0].updated_at >= w[1].updated_at),
            "list must be sorted by updatedAt descending"
        );
    }

    #[test]
    fn distinct_episodes_of_one_title_are_separate_entries() {
        let (_dir, store) = temp_store();

        store.upsert(entry("ABC123", 1, 10.0));
        store.upsert(entry("ABC123", 2, 5.0));

        assert_eq!(store.list().len(), 2);
        assert_eq!(store.find_latest(&"ABC123".into()).unwrap().ep, 2);
    }

    #[test]
    fn survives_restart_and_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("continue.json");

        let store = ContinueStore::open(&path);
        store.upsert(entry("ABC123", 3, 77.0));
        drop(store);

        let reopened = ContinueStore::open(&path);
        assert_eq!(reopened.find(&"ABC123".into(), 3).unwrap().time, 77.0);

        std::fs::write(&path, "{not json").unwrap();
        let corrupted = ContinueStore::open(&path);
        assert!(corrupted.list().is_empty());
    }

    #[test]
    fn clear_empties_list_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("continue.json");

        let store = ContinueStore::open(&path);
        store.upsert(entry("ABC123", 1, 10.0));
        store.clear();

        assert!(store.list().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }
}
