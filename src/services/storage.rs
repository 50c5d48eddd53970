//! Elapsed-time persistence backends

use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ElapsedStore;
use crate::error::StoreError;

/// On-disk form of a persisted session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub accumulated_seconds: u64,
    pub saved_at: DateTime<Utc>,
}

/// Stores the session stopwatch as a small JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the full session file, if one exists
    pub fn load(&self) -> Result<Option<SessionFile>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ElapsedStore for JsonFileStore {
    fn persist_elapsed(&self, seconds: u64) -> Result<(), StoreError> {
        let file = SessionFile {
            accumulated_seconds: seconds,
            saved_at: Utc::now(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        debug!("Persisted {}s to {}", seconds, self.path.display());
        Ok(())
    }

    fn restore_elapsed(&self) -> Result<Option<u64>, StoreError> {
        let restored = self.load()?;
        if let Some(file) = &restored {
            info!(
                "Restoring session from {}: {}s saved at {}",
                self.path.display(),
                file.accumulated_seconds,
                file.saved_at
            );
        }
        Ok(restored.map(|file| file.accumulated_seconds))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store, used when nothing should outlive the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    seconds: Mutex<Option<u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elapsed(seconds: u64) -> Self {
        Self {
            seconds: Mutex::new(Some(seconds)),
        }
    }

    pub fn stored(&self) -> Option<u64> {
        *self.seconds.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ElapsedStore for MemoryStore {
    fn persist_elapsed(&self, seconds: u64) -> Result<(), StoreError> {
        *self.seconds.lock().unwrap_or_else(|e| e.into_inner()) = Some(seconds);
        Ok(())
    }

    fn restore_elapsed(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.stored())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.seconds.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> JsonFileStore {
        let path = std::env::temp_dir().join(format!(
            "workout-timer-{}-{}.json",
            name,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        JsonFileStore::new(path)
    }

    #[test]
    fn missing_file_restores_nothing() {
        let store = temp_store("missing");
        assert_eq!(store.restore_elapsed().unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let store = temp_store("round-trip");

        store.persist_elapsed(1_234).unwrap();
        assert_eq!(store.restore_elapsed().unwrap(), Some(1_234));

        store.clear().unwrap();
        assert_eq!(store.restore_elapsed().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let store = temp_store("corrupt");
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.restore_elapsed(), Err(StoreError::Serde(_))));
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::with_elapsed(10);
        store.persist_elapsed(25).unwrap();
        assert_eq!(store.restore_elapsed().unwrap(), Some(25));
    }
}
