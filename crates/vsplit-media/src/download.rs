//! Source media acquisition.
//!
//! Materializes the caller's source reference as a local file named
//! `<destination_prefix><ext>`, where `<ext>` is taken from the reference's
//! path so the encoder can keep the source container for its outputs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};
use crate::split::cleanup::CleanupGuard;

/// Fetches a source reference into local storage.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `reference` to a file whose name starts with `destination_prefix`.
    ///
    /// Returns the full local path, including the extension. Nothing is left
    /// at that path when the fetch fails or the future is dropped early.
    async fn fetch(&self, reference: &str, destination_prefix: &Path) -> MediaResult<PathBuf>;
}

/// HTTP(S) and `file://` fetcher.
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
    client: Client,
}

impl HttpSourceFetcher {
    /// Create a fetcher with an overall request timeout.
    pub fn new(timeout: Duration) -> MediaResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MediaError::internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &Url, dest: &Path) -> MediaResult<()> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MediaError::download_failed(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::download_failed(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| MediaError::download_failed(format!("reading body failed: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bytes = written, "Finished streaming source body");
        Ok(())
    }

    async fn fetch_file(url: &Url, dest: &Path) -> MediaResult<()> {
        let src = url
            .to_file_path()
            .map_err(|_| MediaError::UnsupportedSource(url.to_string()))?;
        if !src.exists() {
            return Err(MediaError::download_failed(format!(
                "source file {} does not exist",
                src.display()
            )));
        }
        tokio::fs::copy(&src, dest).await?;
        Ok(())
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, reference: &str, destination_prefix: &Path) -> MediaResult<PathBuf> {
        let url = Url::parse(reference)
            .map_err(|_| MediaError::UnsupportedSource(reference.to_string()))?;

        let dest = destination_with_extension(destination_prefix, extension_from_url(&url));
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Downloading source from {} to {}", reference, dest.display());

        // Removes a partial download on error and when the caller gives up mid-body.
        let mut guard = CleanupGuard::new();
        guard.track(&dest);

        let result = match url.scheme() {
            "http" | "https" => self.fetch_http(&url, &dest).await,
            "file" => Self::fetch_file(&url, &dest).await,
            other => Err(MediaError::UnsupportedSource(format!(
                "scheme '{}' in {}",
                other, reference
            ))),
        };

        result.map_err(|e| match e {
            MediaError::Io(io) => MediaError::download_failed(io.to_string()),
            other => other,
        })?;

        let size = tokio::fs::metadata(&dest).await?.len();
        info!(
            output = %dest.display(),
            size_mb = size as f64 / (1024.0 * 1024.0),
            "Downloaded source successfully"
        );
        guard.disarm();
        Ok(dest)
    }
}

/// File extension (with the leading dot) of the last URL path segment, if any.
pub fn extension_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.last()?;
    let ext = Path::new(last).extension()?.to_str()?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

fn destination_with_extension(prefix: &Path, ext: Option<String>) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    if let Some(ext) = ext {
        name.push(ext);
    }
    PathBuf::from(name)
}
