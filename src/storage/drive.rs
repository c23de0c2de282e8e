//! Google Drive v3 storage backend
//!
//! - upload: multipart upload of JSON metadata plus file content
//! - fetch: file metadata (`mimeType`) followed by the media download
//! - delete: permanent delete by file id

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{StorageBackend, StoredFile, TokenSource};
use crate::types::{AppError, AppResult};

pub struct DriveStorage {
    client: Client,
    tokens: TokenSource,
    api_base: String,
    upload_base: String,
}

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    mime_type: String,
}

impl DriveStorage {
    pub fn new(tokens: TokenSource, api_base: &str, upload_base: &str) -> Self {
        Self {
            client: Client::new(),
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        }
    }

    /// URL of one file resource. Drive ids are `[A-Za-z0-9_-]+`; anything
    /// else could address a different resource and is rejected.
    fn file_url(&self, file_id: &str) -> AppResult<String> {
        let valid = !file_id.is_empty()
            && file_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::InvalidRequest(format!("Invalid file id: {:?}", file_id)));
        }
        Ok(format!("{}/files/{}", self.api_base, file_id))
    }

    async fn send(&self, request: RequestBuilder, file_id: Option<&str>) -> AppResult<Response> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Drive request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("file {}", file_id.unwrap_or("?"))));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("Drive API error ({}): {}", status, body)));
        }
        Ok(response)
    }
}

/// Assemble a `multipart/related` body: JSON metadata first, then the media
pub fn multipart_related_body(boundary: &str, metadata: &serde_json::Value, data: &[u8], mime_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl StorageBackend for DriveStorage {
    async fn upload(&self, name: &str, data: Vec<u8>, mime_type: &str, folder_id: &str) -> AppResult<String> {
        let boundary = format!("speakingdoc-{}", Uuid::new_v4().simple());
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
        });
        let body = multipart_related_body(&boundary, &metadata, &data, mime_type);

        let request = self
            .client
            .post(format!("{}/files", self.upload_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);

        let created: CreatedFile = self
            .send(request, None)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Invalid Drive upload response: {}", e)))?;

        info!(file_id = %created.id, name = %name, size = data.len(), "Uploaded file to Drive");
        Ok(created.id)
    }

    async fn fetch(&self, file_id: &str) -> AppResult<StoredFile> {
        let request = self
            .client
            .get(self.file_url(file_id)?)
            .query(&[("fields", "mimeType")]);
        let metadata: FileMetadata = self
            .send(request, Some(file_id))
            .await?
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Invalid Drive metadata response: {}", e)))?;

        let request = self.client.get(self.file_url(file_id)?).query(&[("alt", "media")]);
        let data = self
            .send(request, Some(file_id))
            .await?
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("Drive download failed: {}", e)))?;

        debug!(file_id = %file_id, mime_type = %metadata.mime_type, size = data.len(), "Fetched file from Drive");
        Ok(StoredFile {
            mime_type: metadata.mime_type,
            data: data.to_vec(),
        })
    }

    async fn delete(&self, file_id: &str) -> AppResult<()> {
        let request = self.client.delete(self.file_url(file_id)?);
        self.send(request, Some(file_id)).await?;
        info!(file_id = %file_id, "Deleted file from Drive");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "drive"
    }
}
