// store.rs - Keyed storage for saved recordings

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use conway::RecordingRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub type RecordingId = u64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("recording store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored recording is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no recording with id {0}")]
    NotFound(RecordingId),
}

/// A recording plus the bookkeeping the store adds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecording {
    pub id: RecordingId,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub saved_at_ms: u64,
    pub record: RecordingRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub id: RecordingId,
    pub name: String,
    pub saved_at_ms: u64,
    pub total_generations: usize,
    pub rule_string: String,
}

impl From<&StoredRecording> for RecordingSummary {
    fn from(stored: &StoredRecording) -> Self {
        Self {
            id: stored.id,
            name: stored.name.clone(),
            saved_at_ms: stored.saved_at_ms,
            total_generations: stored.record.metadata.total_generations,
            rule_string: stored.record.metadata.rule_string.clone(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Persistence for recordings. The store assigns ids and timestamps; failures are not retried.
/// Ids are never reused, even after the newest recording is deleted.
#[allow(async_fn_in_trait)]
pub trait RecordingStore {
    async fn save(&self, name: &str, record: &RecordingRecord) -> Result<RecordingId, StoreError>;
    async fn load(&self, id: RecordingId) -> Result<StoredRecording, StoreError>;
    async fn delete(&self, id: RecordingId) -> Result<(), StoreError>;
    /// Summaries ordered by id.
    async fn list(&self) -> Result<Vec<RecordingSummary>, StoreError>;
}

const LAST_ID_FILE: &str = "last-id";

/// One JSON file per recording inside a directory, plus a `last-id` high-water mark.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: RecordingId) -> PathBuf {
        self.dir.join(format!("recording-{id}.json"))
    }

    fn id_of(path: &Path) -> Option<RecordingId> {
        path.file_name()?
            .to_str()?
            .strip_prefix("recording-")?
            .strip_suffix(".json")?
            .parse()
            .ok()
    }

    async fn ids(&self) -> Result<Vec<RecordingId>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(id) = Self::id_of(&entry.path()) {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    async fn last_issued(&self) -> Result<RecordingId, StoreError> {
        match tokio::fs::read_to_string(self.dir.join(LAST_ID_FILE)).await {
            Ok(raw) => Ok(raw.trim().parse().unwrap_or_else(|_| {
                warn!(raw = raw.trim(), "ignoring corrupt id counter");
                0
            })),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(err.into()),
        }
    }

    async fn next_id(&self) -> Result<RecordingId, StoreError> {
        let newest = self.ids().await?.last().copied().unwrap_or(0);
        let id = newest.max(self.last_issued().await?) + 1;
        tokio::fs::write(self.dir.join(LAST_ID_FILE), id.to_string()).await?;
        Ok(id)
    }
}

impl RecordingStore for JsonFileStore {
    async fn save(&self, name: &str, record: &RecordingRecord) -> Result<RecordingId, StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let id = self.next_id().await?;
        let stored = StoredRecording {
            id,
            name: name.to_string(),
            saved_at_ms: now_ms(),
            record: record.clone(),
        };
        let path = self.path_for(id);
        tokio::fs::write(&path, serde_json::to_vec(&stored)?).await?;
        debug!(id, path = %path.display(), "recording written");
        Ok(id)
    }

    async fn load(&self, id: RecordingId) -> Result<StoredRecording, StoreError> {
        let raw = match tokio::fs::read(self.path_for(id)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn delete(&self, id: RecordingId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<RecordingSummary>, StoreError> {
        let mut summaries = Vec::new();
        for id in self.ids().await? {
            match self.load(id).await {
                Ok(stored) => summaries.push(RecordingSummary::from(&stored)),
                Err(err) => warn!(id, %err, "skipping unreadable recording"),
            }
        }
        Ok(summaries)
    }
}

/// Store kept in memory, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    recordings: BTreeMap<RecordingId, StoredRecording>,
    last_id: RecordingId,
}

impl RecordingStore for MemoryStore {
    async fn save(&self, name: &str, record: &RecordingRecord) -> Result<RecordingId, StoreError> {
        let mut state = self.state.lock().await;
        state.last_id += 1;
        let id = state.last_id;
        state.recordings.insert(
            id,
            StoredRecording {
                id,
                name: name.to_string(),
                saved_at_ms: now_ms(),
                record: record.clone(),
            },
        );
        Ok(id)
    }

    async fn load(&self, id: RecordingId) -> Result<StoredRecording, StoreError> {
        self.state
            .lock()
            .await
            .recordings
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: RecordingId) -> Result<(), StoreError> {
        self.state
            .lock()
            .await
            .recordings
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<RecordingSummary>, StoreError> {
        Ok(self
            .state
            .lock()
            .await
            .recordings
            .values()
            .map(RecordingSummary::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use conway::{Engine, Recorder, RecordingSettings};

    use super::*;

    fn unique_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "conway-studio-{label}-{}-{}",
            std::process::id(),
            now_ms()
        ))
    }

    fn sample_record() -> RecordingRecord {
        let mut engine = Engine::new(6, 6).unwrap();
        engine.randomize(0.5, Some(11));
        let mut recorder = Recorder::new();
        let start = Instant::now();
        recorder.start_recording(start, &engine.rules_as_string());
        for t in 1..=3 {
            engine.step();
            recorder.record_generation(&engine, start + Duration::from_millis(100 * t));
        }
        recorder
            .to_record(RecordingSettings {
                cell_size: 12,
                rows: 6,
                cols: 6,
                speed: 5.0,
                custom_rules: engine.rules().into(),
            })
            .unwrap()
    }

    async fn exercise(store: &impl RecordingStore) {
        let record = sample_record();
        assert!(store.list().await.unwrap().is_empty());

        let first = store.save("first", &record).await.unwrap();
        let second = store.save("second", &record).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let loaded = store.load(second).await.unwrap();
        assert_eq!(loaded.name, "second");
        assert_eq!(loaded.record, record);

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["first", "second"]);

        store.delete(first).await.unwrap();
        assert!(matches!(store.load(first).await, Err(StoreError::NotFound(1))));
        assert!(matches!(store.delete(first).await, Err(StoreError::NotFound(1))));

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total_generations, 3);
        assert_eq!(summaries[0].rule_string, "B3/S23");

        // Deleting the newest recording does not free its id
        store.delete(second).await.unwrap();
        let third = store.save("third", &record).await.unwrap();
        assert_eq!(third, 3);
        assert!(matches!(store.load(second).await, Err(StoreError::NotFound(2))));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        exercise(&MemoryStore::default()).await;
    }

    #[tokio::test]
    async fn json_file_store_round_trip() {
        let dir = unique_dir("files");
        let store = JsonFileStore::new(&dir);
        exercise(&store).await;

        let raw = tokio::fs::read_to_string(dir.join("recording-3.json")).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["record"]["metadata"]["totalGenerations"], 3);
        assert!(value["record"]["generations"][0]["timestampOffsetMs"].is_u64());

        // A fresh handle on the same directory continues after the high-water mark
        let reopened = JsonFileStore::new(&dir);
        reopened.delete(3).await.unwrap();
        assert_eq!(reopened.save("fourth", &sample_record()).await.unwrap(), 4);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let store = JsonFileStore::new(unique_dir("absent"));
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(store.load(7).await, Err(StoreError::NotFound(7))));
    }

    #[test]
    fn file_names_map_to_ids() {
        assert_eq!(JsonFileStore::id_of(Path::new("/x/recording-12.json")), Some(12));
        assert_eq!(JsonFileStore::id_of(Path::new("/x/notes.json")), None);
        assert_eq!(JsonFileStore::id_of(Path::new("/x/recording-a.json")), None);
    }
}
