//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Unreadable duration from ffprobe: {0:?}")]
    InvalidDuration(String),

    #[error("Download failed: {message}")]
    DownloadFailed { message: String },

    #[error("Unsupported source reference: {0}")]
    UnsupportedSource(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Job id '{0}' cannot be used as a file name prefix")]
    InvalidJobId(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a download failure error.
    pub fn download_failed(message: impl Into<String>) -> Self {
        Self::DownloadFailed {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the error happened while acquiring the source media.
    pub fn is_acquisition(&self) -> bool {
        matches!(
            self,
            MediaError::DownloadFailed { .. } | MediaError::UnsupportedSource(_)
        )
    }
}
