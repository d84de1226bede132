use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{fs, io};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failure for key '{key}'")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

/// Durable string-keyed storage for in-progress attempt and unlock state.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Key builders. These exact formats are shared with earlier deployments, so
/// state written before an upgrade keeps loading after it.
pub mod keys {
    pub fn attempt_answers(exam_id: i64, user_id: i64) -> String {
        format!("lesson-{exam_id}-{user_id}-answers")
    }

    pub fn attempt_time(exam_id: i64, user_id: i64) -> String {
        format!("lesson-{exam_id}-{user_id}-time")
    }

    pub fn unlock_start_time(user_id: i64, exam_group_id: i64) -> String {
        format!("unlockStartTime-{user_id}-{exam_group_id}")
    }

    pub fn unlocking_exam_id(user_id: i64, exam_group_id: i64) -> String {
        format!("unlockingExamId-{user_id}-{exam_group_id}")
    }
}

/// File-per-key store under a state directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        self.dir.join(sanitized)
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { key: key.to_string(), source }),
        }
    }
}

/// In-memory store for tests and embedders with their own persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_builders_match_legacy_formats() {
        assert_eq!(keys::attempt_answers(41, 7), "lesson-41-7-answers");
        assert_eq!(keys::attempt_time(41, 7), "lesson-41-7-time");
        assert_eq!(keys::unlock_start_time(7, 9), "unlockStartTime-7-9");
        assert_eq!(keys::unlocking_exam_id(7, 9), "unlockingExamId-7-9");
    }

    #[test]
    fn memory_store_round_trips_and_tolerates_missing_removal() {
        let store = MemoryStore::new();
        assert!(store.get("absent").is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::new(dir.path().to_path_buf()).unwrap();
            store.set(&keys::attempt_time(1, 2), "885").unwrap();
        }
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get(&keys::attempt_time(1, 2)).as_deref(), Some("885"));
        store.remove(&keys::attempt_time(1, 2)).unwrap();
        store.remove(&keys::attempt_time(1, 2)).unwrap();
        assert!(store.get(&keys::attempt_time(1, 2)).is_none());
    }
}
