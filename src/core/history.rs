//! History Store (C4). Durable `(video_id, format) -> HistoryRecord`
//! mapping. Backed by a single atomically-rewritten JSON document rather
//! than an embedded database (resolved Open Question, see DESIGN.md and
//! SPEC_FULL.md §4.4) — the teacher's settings persistence already supplies
//! exactly the atomic-write discipline this store needs, so no new
//! dependency is introduced.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;

use super::domain::{HistoryKey, HistoryRecord, Metadata, OutputFormat};
use super::json_io::{read_json_file, write_json_file};

pub struct HistoryStore {
    path: PathBuf,
    records: Mutex<HashMap<String, HistoryRecord>>,
}

impl HistoryStore {
    /// Opens (or creates) the store at `path`. Missing-file tolerant, per
    /// §4.4's "must be reopenable across process restarts".
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let records = if path.exists() {
            read_json_file(&path)?
        } else {
            HashMap::new()
        };
        Ok(HistoryStore { path, records: Mutex::new(records) })
    }

    pub fn is_downloaded(&self, video_id: &str, format: OutputFormat) -> bool {
        let key = HistoryKey::new(video_id, format).to_storage_string();
        self.records.lock().unwrap_or_else(|e| e.into_inner()).contains_key(&key)
    }

    /// Legacy query: true if `video_id` has been downloaded in *any*
    /// format (§4.4).
    pub fn is_downloaded_any_format(&self, video_id: &str) -> bool {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.keys().filter_map(|k| HistoryKey::from_storage_string(k)).any(|k| k.video_id == video_id)
    }

    pub fn add(&self, video_id: &str, format: OutputFormat, metadata: &Metadata) -> anyhow::Result<()> {
        let key = HistoryKey::new(video_id, format);
        let record = HistoryRecord {
            title: metadata.display_title().to_string(),
            uploader: metadata.display_uploader().to_string(),
            completed_at: Utc::now().to_rfc3339(),
        };
        {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.insert(key.to_storage_string(), record);
        }
        self.flush()
    }

    /// `list_history` (§4.10.1 read-only query): every `(video_id, format)`
    /// key paired with its record, for client-side hydration.
    pub fn list(&self) -> Vec<(HistoryKey, HistoryRecord)> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .filter_map(|(key, record)| HistoryKey::from_storage_string(key).map(|k| (k, record.clone())))
            .collect()
    }

    pub fn remove(&self, video_id: &str, format: OutputFormat) -> anyhow::Result<()> {
        let key = HistoryKey::new(video_id, format).to_storage_string();
        {
            let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records.remove(&key);
        }
        self.flush()
    }

    fn flush(&self) -> anyhow::Result<()> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        write_json_file(&self.path, &*records)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn add_then_is_downloaded_round_trips() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        assert!(!store.is_downloaded("ABC", OutputFormat::Mp4));
        store.add("ABC", OutputFormat::Mp4, &Metadata::default()).unwrap();
        assert!(store.is_downloaded("ABC", OutputFormat::Mp4));
        assert!(!store.is_downloaded("ABC", OutputFormat::Webm));
        assert!(store.is_downloaded_any_format("ABC"));
    }

    #[test]
    fn remove_clears_entry() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("history.json")).unwrap();
        store.add("ABC", OutputFormat::Mp4, &Metadata::default()).unwrap();
        store.remove("ABC", OutputFormat::Mp4).unwrap();
        assert!(!store.is_downloaded("ABC", OutputFormat::Mp4));
    }

    #[test]
    fn reopens_across_process_restarts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        {
            let store = HistoryStore::open(&path).unwrap();
            store.add("XYZ", OutputFormat::Mp3, &Metadata::default()).unwrap();
        }
        let reopened = HistoryStore::open(&path).unwrap();
        assert!(reopened.is_downloaded("XYZ", OutputFormat::Mp3));
    }

    #[test]
    fn missing_file_is_tolerated() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("does-not-exist.json")).unwrap();
        assert!(!store.is_downloaded("ABC", OutputFormat::Mp4));
    }
}
