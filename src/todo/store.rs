use super::types::{Task, TaskId};
use crate::shared::errors::StorageError;
use crate::shared::paths::ensure_dir;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Key-value backends
// ============================================================================

/// A flat string-to-string store. Values are replaced whole on `set`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.trim().is_empty()
        || key.contains(|c: char| c == '/' || c == '\\')
        || key == "."
        || key == "..";
    if invalid {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// Stores each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        ensure_dir(&self.dir)
            .map_err(|e| StorageError::directory(format!("{}: {}", self.dir.display(), e)))?;

        // Readers only ever see the old blob or the new one
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp_path, value).map_err(StorageError::WriteError)?;
        std::fs::rename(&tmp_path, &path).map_err(StorageError::WriteError)?;

        tracing::trace!(
            target: "todo::store",
            path = %path.display(),
            bytes = value.len(),
            "Wrote value"
        );
        Ok(())
    }
}

/// In-memory backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Snapshot adapter
// ============================================================================

/// Reads and writes the whole task collection as one JSON array under a
/// single key.
pub struct SnapshotStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Returns the last saved collection. Absent, unreadable or malformed
    /// values all yield an empty collection.
    pub fn load(&self) -> Vec<Task> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::info!(target: "todo::store", key = %self.key, "No snapshot stored, starting empty");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(target: "todo::store", key = %self.key, "Failed to read snapshot: {}", e);
                return Vec::new();
            }
        };

        match parse_snapshot(&raw) {
            Ok(tasks) => {
                tracing::info!(target: "todo::store", key = %self.key, count = tasks.len(), "Snapshot loaded");
                tasks
            }
            Err(e) => {
                tracing::warn!(
                    target: "todo::store",
                    key = %self.key,
                    "Stored snapshot is malformed, starting empty: {}",
                    e
                );
                Vec::new()
            }
        }
    }

    /// Overwrites the stored snapshot with `tasks`, in order.
    pub fn save(&self, tasks: &[Task]) -> Result<(), StorageError> {
        let content = serde_json::to_string(tasks)?;
        self.backend.set(&self.key, &content)?;
        tracing::debug!(target: "todo::store", key = %self.key, count = tasks.len(), "Snapshot saved");
        Ok(())
    }
}

/// Parses a stored array. Text is trimmed; records left blank or carrying a
/// repeated id cannot satisfy the collection's invariants and are dropped.
fn parse_snapshot(raw: &str) -> Result<Vec<Task>, StorageError> {
    let records: Vec<Task> = serde_json::from_str(raw)?;
    let total = records.len();

    let mut seen: HashSet<TaskId> = HashSet::with_capacity(total);
    let tasks: Vec<Task> = records
        .into_iter()
        .map(|mut task| {
            if task.text.trim().len() != task.text.len() {
                task.text = task.text.trim().to_string();
            }
            task
        })
        .filter(|task| !task.text.is_empty())
        .filter(|task| seen.insert(task.id.clone()))
        .collect();

    let dropped = total - tasks.len();
    if dropped > 0 {
        tracing::warn!(target: "todo::store", dropped, "Dropped invalid records from snapshot");
    }

    Ok(tasks)
}
