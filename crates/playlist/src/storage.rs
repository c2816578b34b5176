use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::clip::ClipList;
use crate::error::{PlaylistError, Result};

/// Slot name used when no other name is configured.
pub const DEFAULT_STORAGE_SLOT: &str = "videoClips";

/// Persistent key-value slot holding the serialized clip list.
pub trait ClipStorage {
    /// Reads the persisted list. Returns `Ok(None)` when the slot is empty.
    ///
    /// Returned lists are parsed but not yet checked against list invariants.
    fn load(&self) -> Result<Option<ClipList>>;

    /// Replaces the persisted list.
    fn save(&self, clips: &ClipList) -> Result<()>;
}

/// In-memory slot holding serialized JSON text.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<MemorySlot>>,
}

#[derive(Debug, Default)]
struct MemorySlot {
    json: Option<String>,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose slot already holds `json`.
    pub fn with_json(json: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.lock().json = Some(json.into());
        storage
    }

    /// Returns the raw slot contents.
    pub fn json(&self) -> Option<String> {
        self.lock().json.clone()
    }

    /// Returns how many times the slot was written.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemorySlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClipStorage for MemoryStorage {
    fn load(&self) -> Result<Option<ClipList>> {
        let Some(json) = self.json() else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save(&self, clips: &ClipList) -> Result<()> {
        let json = serde_json::to_string(clips)?;
        let mut slot = self.lock();
        slot.json = Some(json);
        slot.saves += 1;
        Ok(())
    }
}

/// One pretty-printed JSON file per slot: `<dir>/<slot>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Stores the slot `slot` inside `dir`.
    pub fn new(dir: impl AsRef<Path>, slot: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{slot}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ClipStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<ClipList>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "clip slot is empty");
                return Ok(None);
            }
            Err(source) => {
                return Err(PlaylistError::StorageIo {
                    context: "read clip slot",
                    path: self.path.clone(),
                    source,
                });
            }
        };

        // Invalid UTF-8 surfaces as a serialization error.
        let clips: ClipList = serde_json::from_slice(&raw)?;
        debug!(path = %self.path.display(), clip_count = clips.len(), "clip slot loaded");
        Ok(Some(clips))
    }

    fn save(&self, clips: &ClipList) -> Result<()> {
        let json = serde_json::to_string_pretty(clips)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PlaylistError::StorageIo {
                context: "create clip slot directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp_path = self.temp_path();
        std::fs::write(&temp_path, json.as_bytes()).map_err(|source| {
            PlaylistError::StorageIo {
                context: "write clip slot",
                path: temp_path.clone(),
                source,
            }
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = std::fs::remove_file(&temp_path);
            PlaylistError::StorageIo {
                context: "replace clip slot",
                path: self.path.clone(),
                source,
            }
        })?;

        info!(path = %self.path.display(), clip_count = clips.len(), "clip slot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipStorage, JsonFileStorage, MemoryStorage};
    use crate::clip::{Clip, ClipList};
    use crate::error::PlaylistError;

    fn sample_list() -> ClipList {
        ClipList::with_full_video("Full video", 52.0).with_appended(Clip {
            name: "Intro".to_string(),
            start: 0.0,
            end: 10.0,
            tags: vec!["a".to_string(), "b".to_string()],
        })
    }

    fn unique_temp_dir(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "clipdeck-{label}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("system clock must be after unix epoch")
                .as_nanos()
        ))
    }

    #[test]
    fn memory_storage_round_trips_and_counts_saves() {
        let storage = MemoryStorage::new();
        assert!(storage.load().expect("empty load").is_none());

        storage.save(&sample_list()).expect("save should succeed");
        storage.save(&sample_list()).expect("save should succeed");

        assert_eq!(storage.load().expect("load"), Some(sample_list()));
        assert_eq!(storage.save_count(), 2);
    }

    #[test]
    fn memory_storage_clones_share_the_slot() {
        let storage = MemoryStorage::new();
        let observer = storage.clone();

        storage.save(&sample_list()).expect("save should succeed");

        assert_eq!(observer.save_count(), 1);
        assert!(observer.json().expect("json").contains("\"Intro\""));
    }

    #[test]
    fn memory_storage_reports_malformed_json() {
        let storage = MemoryStorage::with_json("{not json");
        assert!(matches!(
            storage.load(),
            Err(PlaylistError::StorageSerialization { .. })
        ));
    }

    #[test]
    fn file_storage_round_trips_through_slot_file() {
        let dir = unique_temp_dir("file-storage");
        let storage = JsonFileStorage::new(&dir, "videoClips");
        assert!(storage.load().expect("missing slot").is_none());

        storage.save(&sample_list()).expect("save should succeed");

        assert!(dir.join("videoClips.json").exists());
        assert!(!dir.join("videoClips.json.tmp").exists());
        assert_eq!(storage.load().expect("load"), Some(sample_list()));

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn file_storage_writes_plain_record_array() {
        let dir = unique_temp_dir("file-layout");
        let storage = JsonFileStorage::new(&dir, "videoClips");
        storage.save(&sample_list()).expect("save should succeed");

        let raw = std::fs::read_to_string(storage.path()).expect("read slot");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value[1]["name"], "Intro");
        assert_eq!(value[1]["end"], 10.0);
        assert_eq!(value[1]["tags"][1], "b");

        std::fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn file_storage_reports_invalid_utf8_as_malformed_data() {
        let dir = unique_temp_dir("file-utf8");
        let storage = JsonFileStorage::new(&dir, "videoClips");
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(storage.path(), [0xff, 0xfe, 0x00]).expect("write bytes");

        assert!(matches!(
            storage.load(),
            Err(PlaylistError::StorageSerialization { .. })
        ));

        std::fs::remove_dir_all(dir).expect("cleanup");
    }
}
