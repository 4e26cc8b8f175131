//! Split job execution.
//!
//! Runs the split pipeline for one [`SplitJob`], publishes every produced
//! segment, removes local artifacts and assembles the response. Item order
//! always matches the job's `splits`.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tracing::Instrument;

use vsplit_media::split::cleanup::remove_quietly;
use vsplit_media::{
    FfmpegBackend, HttpSourceFetcher, MediaBackend, SourceFetcher, SplitOrchestrator, SplitRequest,
};
use vsplit_models::segment::UNPROCESSED;
use vsplit_models::{JobId, JobOutcome, SegmentRequest, SegmentResult, SplitJob, SplitResponseItem};
use vsplit_storage::ArtifactUploader;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::{JobLogger, PublishSummary};
use crate::retry::{retry_async, RetryConfig};

/// Read a job from a JSON file, or from stdin when no path is given.
pub async fn read_job(path: Option<&Path>) -> WorkerResult<SplitJob> {
    let raw = match path {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            raw
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Executes split jobs end to end.
pub struct SplitJobRunner<B, F, U> {
    orchestrator: SplitOrchestrator<B, F>,
    uploader: U,
    retry: RetryConfig,
    job_timeout: Option<Duration>,
}

impl<U: ArtifactUploader> SplitJobRunner<FfmpegBackend, HttpSourceFetcher, U> {
    /// Runner backed by the ffmpeg CLI and an HTTP fetcher.
    pub fn from_config(config: &WorkerConfig, uploader: U) -> WorkerResult<Self> {
        let mut backend = FfmpegBackend::new();
        if let Some(limit) = config.encode_timeout {
            backend = backend.with_encode_timeout(limit.as_secs());
        }
        let fetcher = HttpSourceFetcher::new(config.download_timeout)?;
        let orchestrator = SplitOrchestrator::new(backend, fetcher, &config.work_dir);

        Ok(Self::new(orchestrator, uploader)
            .with_retry(RetryConfig::new("split_upload").with_max_retries(config.upload_retries))
            .with_job_timeout(config.job_timeout))
    }
}

impl<B: MediaBackend, F: SourceFetcher, U: ArtifactUploader> SplitJobRunner<B, F, U> {
    pub fn new(orchestrator: SplitOrchestrator<B, F>, uploader: U) -> Self {
        Self {
            orchestrator,
            uploader,
            retry: RetryConfig::new("split_upload"),
            job_timeout: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Abandon the split (and clean up its artifacts) after `limit`.
    pub fn with_job_timeout(mut self, limit: Duration) -> Self {
        self.job_timeout = Some(limit);
        self
    }

    /// Run one job. Never fails: whole-job failures become [`JobOutcome::Failed`].
    ///
    /// Local artifacts are namespaced by a freshly generated id rather than
    /// the caller's `id`, so two jobs submitted with the same id never share
    /// files.
    pub async fn run(&self, job: SplitJob) -> JobOutcome {
        let job_id = job.job_id();
        let artifacts = JobId::new();
        let logger = JobLogger::new(&job_id, &artifacts, &job);
        let span = logger.span();

        async {
            logger.started();

            match self.execute(artifacts, job, &logger).await {
                Ok(response) => {
                    logger.completed(PublishSummary::from_items(&response));
                    JobOutcome::completed(job_id.clone(), response)
                }
                Err(e) => {
                    logger.failed(&e.to_string());
                    JobOutcome::failed(job_id.clone(), e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        artifacts: JobId,
        job: SplitJob,
        logger: &JobLogger,
    ) -> WorkerResult<Vec<SplitResponseItem>> {
        job.validate()?;

        let SplitJob {
            video_url,
            splits,
            encoding,
            ..
        } = job;

        let request = SplitRequest::new(video_url, splits.clone())
            .with_options(encoding)
            .with_job_id(artifacts);

        let split = self.orchestrator.split(request);
        let output = match self.job_timeout {
            Some(limit) => tokio::time::timeout(limit, split)
                .await
                .map_err(|_| WorkerError::JobTimeout(limit))??,
            None => split.await?,
        };

        logger.split_finished(output.results.ok_outputs().count());

        let mut response = Vec::with_capacity(splits.len());
        for (index, (request, result)) in splits.iter().zip(output.results.iter()).enumerate() {
            response.push(self.publish(index, request, result, logger).await);
        }

        output.remove_source();
        Ok(response)
    }

    /// Turn one segment result into a response item, uploading `ok` outputs.
    async fn publish(
        &self,
        index: usize,
        request: &SegmentRequest,
        result: &SegmentResult,
        logger: &JobLogger,
    ) -> SplitResponseItem {
        let path = match result.output_path.as_deref() {
            Some(path) if result.is_ok() => path,
            _ => {
                let error = result.error.clone().unwrap_or_else(|| UNPROCESSED.to_string());
                return SplitResponseItem::failed(index, request, error);
            }
        };

        let uploaded = retry_async(&self.retry, || self.uploader.upload(path))
            .await
            .into_result();

        // The local copy is not kept either way.
        remove_quietly(path);

        match uploaded {
            Ok(url) => {
                logger.uploaded(index, &url);
                SplitResponseItem::uploaded(index, request, url)
            }
            Err(e) => {
                logger.upload_failed(index, &e.to_string());
                SplitResponseItem::failed(index, request, format!("Upload failed: {}", e.detail()))
            }
        }
    }
}
