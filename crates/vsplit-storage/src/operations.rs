//! High-level storage operations for split artifacts.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

/// Key prefix under which split outputs are published.
pub const SPLIT_PREFIX: &str = "splits";

/// Publishes a local artifact and returns the URL it can be fetched from.
#[async_trait]
pub trait ArtifactUploader: Send + Sync {
    async fn upload(&self, path: &Path) -> StorageResult<String>;
}

/// Object key for a split output: `splits/<file name>`.
pub fn split_key(path: &Path) -> StorageResult<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;
    Ok(format!("{}/{}", SPLIT_PREFIX, name))
}

/// Content type for a media file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "ts" => "video/mp2t",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        _ => "application/octet-stream",
    }
}

impl R2Client {
    /// Upload a split output and return its URL.
    pub async fn upload_split(&self, path: impl AsRef<Path>) -> StorageResult<String> {
        let path = path.as_ref();
        let key = split_key(path)?;

        self.upload_file(path, &key, content_type_for(path)).await?;
        let url = self.object_url(&key).await?;

        info!(key = %key, "Published split output");
        Ok(url)
    }
}

#[async_trait]
impl ArtifactUploader for R2Client {
    async fn upload(&self, path: &Path) -> StorageResult<String> {
        self.upload_split(path).await
    }
}
