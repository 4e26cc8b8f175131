//! Structured logging for split jobs.
//!
//! Every line carries the job id and the artifact namespace so a job can be
//! followed from the request through each upload to the final tally.

use std::time::Instant;

use tracing::{error, info, warn, Span};
use vsplit_models::{JobId, SplitJob, SplitResponseItem};

/// Operation name attached to job spans.
pub const OPERATION: &str = "video_split";

/// Per-item tally of a finished job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub uploaded: usize,
    pub failed: usize,
}

impl PublishSummary {
    pub fn from_items(items: &[SplitResponseItem]) -> Self {
        let uploaded = items.iter().filter(|i| i.file_url.is_some()).count();
        Self {
            uploaded,
            failed: items.len() - uploaded,
        }
    }
}

/// Lifecycle logger for one split job.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    artifacts: JobId,
    source: String,
    splits: usize,
    started: Instant,
}

impl JobLogger {
    /// `artifacts` is the id prefixing the job's local files.
    pub fn new(job_id: &JobId, artifacts: &JobId, job: &SplitJob) -> Self {
        Self {
            job_id: job_id.clone(),
            artifacts: artifacts.clone(),
            source: job.video_url.clone(),
            splits: job.splits.len(),
            started: Instant::now(),
        }
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            artifacts = %self.artifacts,
            operation = OPERATION,
            splits = self.splits
        )
    }

    pub fn started(&self) {
        info!(source = %self.source, splits = self.splits, "Split job started");
    }

    pub fn split_finished(&self, succeeded: usize) {
        info!(
            succeeded,
            failed = self.splits - succeeded.min(self.splits),
            "Split finished, publishing outputs"
        );
    }

    pub fn uploaded(&self, index: usize, url: &str) {
        info!(index, url, "Uploaded split output");
    }

    pub fn upload_failed(&self, index: usize, reason: &str) {
        warn!(index, reason, "Split output could not be uploaded");
    }

    pub fn failed(&self, reason: &str) {
        error!(
            elapsed_ms = self.elapsed_ms(),
            source = %self.source,
            "Split job failed: {}", reason
        );
    }

    pub fn completed(&self, summary: PublishSummary) {
        info!(
            elapsed_ms = self.elapsed_ms(),
            uploaded = summary.uploaded,
            failed = summary.failed,
            "Split job completed: {}/{} splits uploaded",
            summary.uploaded,
            self.splits
        );
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
