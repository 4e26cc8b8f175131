//! Worker error types.

use std::time::Duration;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid job: {0}")]
    InvalidJob(#[from] vsplit_models::JobValidationError),

    #[error("Job timed out after {0:?}")]
    JobTimeout(Duration),

    #[error(transparent)]
    Media(#[from] vsplit_media::MediaError),

    #[error("Failed to parse job: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
