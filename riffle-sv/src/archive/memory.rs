//! In-memory archive store
//!
//! Backend double used by the test suites and by local development when no
//! cloud credential is configured. Records every folder and upload so tests
//! can assert on call counts.

use super::{ArchiveStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    folders: Vec<(String, String)>,
    uploads: Vec<(String, String, usize)>,
}

/// Archive store keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    create_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of create_folder calls observed
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of uploads stored
    pub fn upload_count(&self) -> usize {
        self.inner.lock().unwrap().uploads.len()
    }

    /// Names uploaded so far, in call order
    pub fn uploaded_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .uploads
            .iter()
            .map(|(_, name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .folders
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id.clone()))
    }

    async fn create_folder(&self, name: &str) -> Result<String, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();
        let id = format!("folder-{}", inner.folders.len() + 1);
        inner.folders.push((id.clone(), name.to_string()));
        Ok(id)
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .uploads
            .push((folder_id.to_string(), name.to_string(), bytes.len()));
        Ok(())
    }
}
