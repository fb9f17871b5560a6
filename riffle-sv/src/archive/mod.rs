//! Archive service
//!
//! Copies accepted samples into a named folder in the user's cloud storage.
//! The destination folder is looked up by name and created only if absent;
//! its id is then cached for the lifetime of the server process. Concurrent
//! first-time requests are serialized by holding the cache lock across the
//! lookup-or-create sequence, so this process never creates duplicates.
//!
//! Each archive request is independent: saving the same sample twice
//! produces two archived copies.

mod drive;
pub mod memory;

pub use drive::DriveStore;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Errors from a storage backend
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Storage backend operations needed by the archive service
///
/// Production uses [`DriveStore`]; tests use [`memory::MemoryStore`].
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Look up a folder by name; `None` when absent.
    async fn find_folder(&self, name: &str) -> std::result::Result<Option<String>, StoreError>;

    /// Create a folder and return its id.
    async fn create_folder(&self, name: &str) -> std::result::Result<String, StoreError>;

    /// Upload a named file into the given folder.
    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> std::result::Result<(), StoreError>;
}

/// Archive service: get-or-create destination folder, then upload
pub struct ArchiveService {
    store: Arc<dyn ArchiveStore>,
    folder_name: String,
    /// Cached destination folder id; the lock also serializes first creation.
    folder_id: Mutex<Option<String>>,
}

impl ArchiveService {
    pub fn new(store: Arc<dyn ArchiveStore>, folder_name: impl Into<String>) -> Self {
        Self {
            store,
            folder_name: folder_name.into(),
            folder_id: Mutex::new(None),
        }
    }

    /// Resolve the destination folder id, creating the folder at most once.
    ///
    /// The lock is held across lookup and create: a second caller waits and
    /// then sees the cached id instead of racing on creation.
    pub async fn ensure_folder(&self) -> Result<String> {
        let mut cached = self.folder_id.lock().await;

        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let id = match self
            .store
            .find_folder(&self.folder_name)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?
        {
            Some(id) => {
                debug!(folder = %self.folder_name, id = %id, "Found existing archive folder");
                id
            }
            None => {
                let id = self
                    .store
                    .create_folder(&self.folder_name)
                    .await
                    .map_err(|e| Error::Upload(e.to_string()))?;
                info!(folder = %self.folder_name, id = %id, "Created archive folder");
                id
            }
        };

        *cached = Some(id.clone());
        Ok(id)
    }

    /// Archive one sample file under its storage name.
    ///
    /// The source may disappear between the route's existence check and the
    /// read here; that surfaces as `NotFound`, not as an upload failure.
    pub async fn archive_file(&self, storage_name: &str, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(storage_name.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let folder_id = self.ensure_folder().await?;

        self.store
            .upload(&folder_id, storage_name, bytes)
            .await
            .map_err(|e| Error::Upload(e.to_string()))?;

        info!(name = %storage_name, "Archived sample");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[tokio::test]
    async fn test_ensure_folder_creates_once() {
        let store = Arc::new(MemoryStore::new());
        let service = ArchiveService::new(store.clone(), "sample saves");

        let first = service.ensure_folder().await.unwrap();
        let second = service.ensure_folder().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_ensure_folder_reuses_existing() {
        let store = Arc::new(MemoryStore::new());
        let existing = store.create_folder("sample saves").await.unwrap();

        let service = ArchiveService::new(store.clone(), "sample saves");
        let id = service.ensure_folder().await.unwrap();

        assert_eq!(id, existing);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_archive_single_folder() {
        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(ArchiveService::new(store.clone(), "sample saves"));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.ensure_folder().await.unwrap() })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }

        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(store.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_archive_missing_source_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = ArchiveService::new(store, "sample saves");

        let result = service
            .archive_file("ghost.wav", Path::new("/nonexistent/ghost.wav"))
            .await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_repeated_archive_uploads_copies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kick.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let store = Arc::new(MemoryStore::new());
        let service = ArchiveService::new(store.clone(), "sample saves");

        service.archive_file("kick.wav", &path).await.unwrap();
        service.archive_file("kick.wav", &path).await.unwrap();

        assert_eq!(store.upload_count(), 2);
        assert_eq!(store.create_calls(), 1);
    }
}
