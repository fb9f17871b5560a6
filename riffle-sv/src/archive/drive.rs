//! Google Drive storage backend
//!
//! Talks to the Drive v3 API with a server-configured bearer credential.
//! Folder lookup uses the files list query by name and folder mime type;
//! uploads use the multipart/related endpoint with a JSON metadata part and
//! the raw audio bytes.

use super::{ArchiveStore, StoreError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const SAMPLE_MIME_TYPE: &str = "audio/wav";
const USER_AGENT: &str = concat!("riffle/", env!("CARGO_PKG_VERSION"));
const MULTIPART_BOUNDARY: &str = "riffle_archive_boundary";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Drive v3 API client
pub struct DriveStore {
    http_client: reqwest::Client,
    access_token: String,
}

impl DriveStore {
    pub fn new(access_token: String) -> Result<Self, StoreError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            access_token,
        })
    }

    async fn check_status(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait]
impl ArchiveStore for DriveStore {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, StoreError> {
        // Single quotes delimit strings in the Drive query language
        let escaped = name.replace('\'', "\\'");
        let query = format!("name = '{escaped}' and mimeType = '{FOLDER_MIME_TYPE}'");

        debug!(folder = %name, "Looking up archive folder");

        let response = self
            .http_client
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let list: DriveFileList = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, name: &str) -> Result<String, StoreError> {
        let response = self
            .http_client
            .post(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id")])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
            }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let folder: DriveFile = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(folder.id)
    }

    async fn upload(
        &self,
        folder_id: &str,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });

        let body = multipart_related_body(&metadata.to_string(), &bytes);

        let response = self
            .http_client
            .post(format!("{DRIVE_UPLOAD_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

/// Assemble the two-part multipart/related payload Drive expects:
/// JSON metadata first, then the media bytes.
fn multipart_related_body(metadata_json: &str, media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata_json.len() + media.len() + 256);

    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata_json.as_bytes());
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {SAMPLE_MIME_TYPE}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(DriveStore::new("token".to_string()).is_ok());
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = multipart_related_body("{\"name\":\"kick.wav\"}", b"RIFF");
        let text = String::from_utf8_lossy(&body);

        assert!(text.starts_with(&format!("--{MULTIPART_BOUNDARY}\r\n")));
        assert!(text.contains("application/json"));
        assert!(text.contains("kick.wav"));
        assert!(text.contains("audio/wav"));
        assert!(text.ends_with(&format!("\r\n--{MULTIPART_BOUNDARY}--\r\n")));
    }
}
