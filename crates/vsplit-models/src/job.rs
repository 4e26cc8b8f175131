//! Split job request and response definitions.

use schemars::JsonSchema;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::encoding::{EncodingError, EncodingOptions};
use crate::segment::SegmentRequest;

/// Endpoint name reported alongside job outcomes.
pub const SPLIT_ENDPOINT: &str = "/v1/video/split";

/// Longest job id accepted as a file name prefix.
pub const MAX_JOB_ID_LEN: usize = 128;

/// Unique identifier for a job.
///
/// Every local artifact of a job is prefixed with it, so two concurrent jobs
/// sharing a work directory never touch each other's files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id can be used verbatim as a file name prefix.
    ///
    /// Only ASCII letters, digits, `-` and `_` are allowed, so an id can
    /// never name a parent directory or a path separator.
    pub fn is_file_name_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_JOB_ID_LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons a split job is refused before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobValidationError {
    #[error("splits must contain at least one entry")]
    NoSplits,

    #[error("invalid video_url '{0}'")]
    InvalidUrl(String),

    #[error("unsupported video_url scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("job id must not be empty")]
    EmptyId,

    #[error("job id '{0}' may only contain ASCII letters, digits, '-' and '_' (at most 128)")]
    InvalidId(String),

    #[error("unknown field(s): {0}")]
    UnknownFields(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A request to cut one source video into independently encoded segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SplitJob {
    /// Source media locator
    pub video_url: String,

    /// Requested cuts, in the order results must be reported
    pub splits: Vec<SegmentRequest>,

    /// Encoding settings shared by all segments
    #[serde(flatten)]
    pub encoding: EncodingOptions,

    /// Caller-supplied job id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Keys not consumed by any field above. `deny_unknown_fields` cannot
    /// be combined with `flatten`, so they are collected and refused in
    /// [`SplitJob::validate`].
    #[serde(flatten, skip_serializing)]
    #[schemars(skip)]
    unknown_fields: BTreeMap<String, IgnoredAny>,
}

impl SplitJob {
    pub fn new(video_url: impl Into<String>, splits: Vec<SegmentRequest>) -> Self {
        Self {
            video_url: video_url.into(),
            splits,
            encoding: EncodingOptions::default(),
            id: None,
            unknown_fields: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The supplied id, or a freshly generated one.
    pub fn job_id(&self) -> JobId {
        self.id
            .as_deref()
            .map(JobId::from_string)
            .unwrap_or_default()
    }

    /// Shape checks that would otherwise be enforced by request-schema validation.
    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.splits.is_empty() {
            return Err(JobValidationError::NoSplits);
        }

        let url = Url::parse(&self.video_url)
            .map_err(|_| JobValidationError::InvalidUrl(self.video_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(JobValidationError::UnsupportedScheme(url.scheme().to_string()));
        }

        if !self.unknown_fields.is_empty() {
            let keys: Vec<&str> = self.unknown_fields.keys().map(String::as_str).collect();
            return Err(JobValidationError::UnknownFields(keys.join(", ")));
        }

        if let Some(id) = self.id.as_deref() {
            if id.trim().is_empty() {
                return Err(JobValidationError::EmptyId);
            }
            if !JobId::from_string(id).is_file_name_safe() {
                return Err(JobValidationError::InvalidId(id.to_string()));
            }
        }

        self.encoding.validate()?;
        Ok(())
    }
}

/// One entry of the job response, aligned to the input `splits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SplitResponseItem {
    /// 0-based position in the input list
    pub index: usize,
    /// Raw start as supplied
    pub start: String,
    /// Raw end as supplied
    pub end: String,
    /// Remote URL of the uploaded segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Failure reason (validation, encode, or upload)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SplitResponseItem {
    pub fn uploaded(index: usize, request: &SegmentRequest, file_url: impl Into<String>) -> Self {
        Self {
            index,
            start: request.start.clone(),
            end: request.end.clone(),
            file_url: Some(file_url.into()),
            error: None,
        }
    }

    pub fn failed(index: usize, request: &SegmentRequest, error: impl Into<String>) -> Self {
        Self {
            index,
            start: request.start.clone(),
            end: request.end.clone(),
            file_url: None,
            error: Some(error.into()),
        }
    }
}

/// Final outcome of a split job as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// The job ran to completion; individual items may still carry errors.
    Completed {
        job_id: JobId,
        endpoint: String,
        status_code: u16,
        response: Vec<SplitResponseItem>,
    },
    /// The job failed as a whole (acquisition or unexpected error).
    Failed {
        job_id: JobId,
        endpoint: String,
        status_code: u16,
        message: String,
    },
}

impl JobOutcome {
    pub fn completed(job_id: JobId, response: Vec<SplitResponseItem>) -> Self {
        Self::Completed {
            job_id,
            endpoint: SPLIT_ENDPOINT.to_string(),
            status_code: 200,
            response,
        }
    }

    pub fn failed(job_id: JobId, message: impl Into<String>) -> Self {
        Self::Failed {
            job_id,
            endpoint: SPLIT_ENDPOINT.to_string(),
            status_code: 500,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Completed { status_code, .. } | Self::Failed { status_code, .. } => *status_code,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
