//! services/cli/src/adapters/file_store.rs
//!
//! This module contains the on-disk persistence adapter, the concrete
//! implementation of the `PersistentStore` port from the `core` crate. Each
//! logical key is mirrored as one JSON file inside the data directory.

use std::path::PathBuf;

use async_trait::async_trait;
use kivo_core::ports::{PersistentStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A persistence adapter that stores each key as a file under a data directory.
#[derive(Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Creates a new `FileStore` rooted at `data_dir`. The directory is
    /// created on the first write if it does not exist.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    async fn ensure_dir(&self) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| PortError::Storage(format!("Failed to create data directory: {e}")))
    }
}

//=========================================================================================
// `PersistentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistentStore for FileStore {
    async fn load(&self, key: &str) -> PortResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Storage(format!("Failed to read '{key}': {e}"))),
        }
    }

    async fn save(&self, key: &str, value: &str) -> PortResult<()> {
        self.ensure_dir().await?;
        let path = self.path_for(key);
        // Write to a sibling temp file and rename, so a crash mid-write never
        // leaves a truncated mirror behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| PortError::Storage(format!("Failed to write '{key}': {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| PortError::Storage(format!("Failed to commit '{key}': {e}")))
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PortError::Storage(format!("Failed to remove '{key}': {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("kivo_projects", "[{\"x\":1}]").await.unwrap();
        let loaded = store.load("kivo_projects").await.unwrap();

        assert_eq!(loaded.as_deref(), Some("[{\"x\":1}]"));
    }

    #[tokio::test]
    async fn load_of_absent_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert_eq!(store.load("kivo_user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn remove_deletes_the_value_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("kivo_user", "{}").await.unwrap();
        store.remove("kivo_user").await.unwrap();
        assert_eq!(store.load("kivo_user").await.unwrap(), None);

        // Removing again is fine.
        store.remove("kivo_user").await.unwrap();
    }

    #[tokio::test]
    async fn save_replaces_the_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save("kivo_projects", "[]").await.unwrap();
        store.save("kivo_projects", "[1]").await.unwrap();

        assert_eq!(store.load("kivo_projects").await.unwrap().as_deref(), Some("[1]"));
    }
}
