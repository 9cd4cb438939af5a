// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the last announced snapshot across daemon restarts so an hour that
// was already announced is not announced again.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of the previous snapshot
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// A single JSON array of eight scalars, next record first:
//
// ```json
// ["Jail", "https://img/9", "Next", "2026-01-01T11:00:00Z",
//  "Oasis", "https://img/5", "Current", "2026-01-01T10:00:00Z"]
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::model::StateSnapshot;
use crate::traits::StateStore;

/// File-based state store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use tzone_core::state::FileStateStore;
/// use tzone_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/tzone/state.json").await?;
///     let last = store.load().await?;
///     println!("last announced: {:?}", last.map(|s| s.current.name));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    cached: Arc<RwLock<Option<StateSnapshot>>>,
}

impl FileStateStore {
    /// Create or load a file state store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing state file
    /// 3. If it is corrupted, try the backup
    /// 4. If nothing is readable, start with no snapshot
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let snapshot = Self::load_state_with_recovery(&path).await;

        Ok(Self {
            path,
            cached: Arc::new(RwLock::new(snapshot)),
        })
    }

    /// Load state from file with automatic recovery
    ///
    /// Never fails: an unreadable state means "nothing announced yet".
    async fn load_state_with_recovery(path: &Path) -> Option<StateSnapshot> {
        match Self::load_state(path).await {
            Ok(snapshot) => {
                tracing::debug!("Loaded state from {}: {:?}", path.display(), snapshot.is_some());
                snapshot
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "State file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty state.");
                    return None;
                }

                match Self::load_state(&backup_path).await {
                    Ok(snapshot) => {
                        tracing::info!("Recovered state from backup");
                        if let Err(restore_err) = Self::restore_from_backup(path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore state file from backup: {}",
                                restore_err
                            );
                        }
                        snapshot
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty state.",
                            backup_err
                        );
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("State file unreadable: {}. Starting with empty state.", e);
                None
            }
        }
    }

    /// Load state from file
    ///
    /// Parse failures surface as `Error::Json` so the caller can tell
    /// corruption apart from I/O failures.
    async fn load_state(path: &Path) -> Result<Option<StateSnapshot>, Error> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::persist(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write a snapshot to file atomically
    async fn write_state(&self, snapshot: &StateSnapshot) -> Result<(), Error> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| Error::persist(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persist(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::persist(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::persist(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous snapshot around for corruption recovery
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persist(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore state file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::persist(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<StateSnapshot>, Error> {
        Ok(self.cached.read().await.clone())
    }

    async fn save(&self, snapshot: &StateSnapshot) -> Result<(), Error> {
        self.write_state(snapshot).await?;
        *self.cached.write().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ZoneRecord, ZoneRole};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;
    use tokio_test::assert_ok;

    fn snapshot(current: &str, next: &str) -> StateSnapshot {
        let ten = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let eleven = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
        StateSnapshot {
            next: ZoneRecord::new(next, "img-next", ZoneRole::Next, eleven),
            current: ZoneRecord::new(current, "img-current", ZoneRole::Current, ten),
        }
    }

    #[tokio::test]
    async fn test_file_store_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);

        let s = snapshot("Oasis", "Jail");
        assert_ok!(store.save(&s).await);
        assert_eq!(store.load().await.unwrap(), Some(s.clone()));
        assert!(path.exists());

        // Load new instance and verify persistence
        let store2 = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store2.load().await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn test_file_holds_flat_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.save(&snapshot("Oasis", "Jail")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let fields = raw.as_array().unwrap();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields[0], "Jail");
        assert_eq!(fields[4], "Oasis");
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        let s = snapshot("Oasis", "Jail");
        assert_ok!(store.save(&s).await);
        assert_ok!(store.save(&s).await);

        assert_eq!(store.load().await.unwrap(), Some(s.clone()));
        let reopened = FileStateStore::new(&path).await.unwrap();
        assert_eq!(reopened.load().await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn test_file_store_corruption_recovery() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        let first = snapshot("Oasis", "Jail");
        store.save(&first).await.unwrap();

        // Second write moves the first snapshot into the backup
        store.save(&snapshot("Tristram", "Cows")).await.unwrap();
        let backup_path = FileStateStore::backup_path(&path);
        assert!(backup_path.exists(), "Backup file should exist after write");

        fs::write(&path, b"corrupted json data").await.unwrap();

        let recovered = FileStateStore::new(&path).await.unwrap();
        assert_eq!(
            recovered.load().await.unwrap(),
            Some(first),
            "Backup should contain previous state, not latest"
        );
    }

    #[tokio::test]
    async fn test_corrupt_without_backup_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not an array").await.unwrap();

        let store = FileStateStore::new(&path).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("state.json");

        let store = FileStateStore::new(&path).await.unwrap();
        store.save(&snapshot("Oasis", "Jail")).await.unwrap();
        assert!(store.path().exists());
    }
}
