//! End-to-end split of one source into independently encoded segments.
//!
//! Flow: acquire source -> probe duration -> validate every request ->
//! encode accepted segments one at a time -> return the order-aligned
//! results. Acquisition failures, an unusable job id, I/O failures preparing
//! the work directory and an encoder that cannot be run at all fail the
//! operation as a whole. A non-zero encoder exit or a rejected request is
//! recorded in that segment's result slot.

use std::path::PathBuf;

use tracing::{info, Instrument};

use vsplit_models::{EncodingOptions, JobId, SegmentRequest, SegmentResult, SegmentResults};

use crate::backend::MediaBackend;
use crate::download::SourceFetcher;
use crate::error::{MediaError, MediaResult};
use crate::probe::duration_or_fallback;
use crate::split::cleanup::{remove_quietly, CleanupGuard};
use crate::split::encoder::SegmentEncoder;
use crate::split::validator::{validate_segments, ValidationOutcome};

/// Input of one split operation.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    /// Locator handed to the [`SourceFetcher`]
    pub source_reference: String,
    /// Requested cuts; at least one
    pub segments: Vec<SegmentRequest>,
    /// Encoding settings for every segment
    pub options: EncodingOptions,
    /// Namespace for local artifacts; generated when absent
    pub job_id: Option<JobId>,
}

impl SplitRequest {
    pub fn new(source_reference: impl Into<String>, segments: Vec<SegmentRequest>) -> Self {
        Self {
            source_reference: source_reference.into(),
            segments,
            options: EncodingOptions::default(),
            job_id: None,
        }
    }

    pub fn with_options(mut self, options: EncodingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }
}

/// Result of a completed split.
///
/// The caller owns every file referenced here: the source and each `ok`
/// output must be removed once they have been consumed.
#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub job_id: JobId,
    /// One result per requested segment, in request order
    pub results: SegmentResults,
    /// Locally acquired source media
    pub source_path: PathBuf,
}

impl SplitOutput {
    /// Delete the acquired source (best effort).
    pub fn remove_source(&self) {
        remove_quietly(&self.source_path);
    }

    /// Delete every produced segment (best effort).
    pub fn remove_outputs(&self) {
        for path in self.results.ok_outputs() {
            remove_quietly(path);
        }
    }
}

/// Runs split operations against a media backend and a source fetcher.
pub struct SplitOrchestrator<B, F> {
    backend: B,
    fetcher: F,
    work_dir: PathBuf,
}

impl<B: MediaBackend, F: SourceFetcher> SplitOrchestrator<B, F> {
    /// `work_dir` is the local storage area shared by all jobs; artifacts are
    /// namespaced inside it by job id.
    pub fn new(backend: B, fetcher: F, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            fetcher,
            work_dir: work_dir.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run one split operation.
    ///
    /// # Errors
    /// Returns an error when the job id is not a plain file name prefix, the
    /// work directory cannot be prepared, the source cannot be acquired, or
    /// the encoder cannot be started. No artifacts of this job remain on disk
    /// after an error, or if the returned future is dropped before completion.
    pub async fn split(&self, request: SplitRequest) -> MediaResult<SplitOutput> {
        let job_id = request.job_id.clone().unwrap_or_default();
        if !job_id.is_file_name_safe() {
            return Err(MediaError::InvalidJobId(job_id.to_string()));
        }
        let span = tracing::info_span!("split", job_id = %job_id);
        self.run(job_id, request).instrument(span).await
    }

    async fn run(&self, job_id: JobId, request: SplitRequest) -> MediaResult<SplitOutput> {
        info!("Starting video split operation for {}", request.source_reference);

        tokio::fs::create_dir_all(&self.work_dir).await?;

        let prefix = self.work_dir.join(format!("{}_input", job_id));
        let source_path = self
            .fetcher
            .fetch(&request.source_reference, &prefix)
            .await?;
        info!("Downloaded video to local file: {}", source_path.display());

        let mut guard = CleanupGuard::new();
        guard.track(&source_path);

        let mut results = SegmentResults::unprocessed(request.segments.len());

        let duration = duration_or_fallback(self.backend.probe_duration(&source_path).await);

        let mut accepted = Vec::new();
        for (ordinal, outcome) in validate_segments(&request.segments, duration)
            .into_iter()
            .enumerate()
        {
            match outcome {
                ValidationOutcome::Accepted(descriptor) => accepted.push(descriptor),
                ValidationOutcome::Rejected(message) => {
                    results.set(ordinal, SegmentResult::failed(message))
                }
            }
        }

        if accepted.is_empty() {
            info!("No valid splits to process");
        } else {
            info!("Processing {} valid splits", accepted.len());

            let encoder = SegmentEncoder::new(
                &self.backend,
                &source_path,
                &request.options,
                &self.work_dir,
                &job_id,
            );

            for descriptor in &accepted {
                // Tracked before the encode starts so an abandoned run also
                // removes a half-written output.
                guard.track(encoder.output_path(descriptor));
                let result = encoder.encode(descriptor).await?;
                results.set(descriptor.ordinal, result);
            }
        }

        guard.disarm();

        let ok = results.ok_outputs().count();
        info!(
            succeeded = ok,
            failed = results.len() - ok,
            "Video split operation finished"
        );

        Ok(SplitOutput {
            job_id,
            results,
            source_path,
        })
    }
}
