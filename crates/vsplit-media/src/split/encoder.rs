//! Per-segment encoding.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use vsplit_models::{format_seconds, EncodingOptions, JobId, SegmentDescriptor, SegmentResult};

use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};

/// Extension of `path` including the leading dot, or an empty string.
pub fn source_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Deterministic artifact path for split number `number` (1-based) of a job.
pub fn segment_output_path(work_dir: &Path, job_id: &JobId, number: usize, extension: &str) -> PathBuf {
    work_dir.join(format!("{}_split_{}{}", job_id, number, extension))
}

/// Encodes accepted segments of one source file.
pub struct SegmentEncoder<'a, B: MediaBackend + ?Sized> {
    backend: &'a B,
    source: &'a Path,
    options: &'a EncodingOptions,
    work_dir: &'a Path,
    job_id: &'a JobId,
    extension: String,
}

impl<'a, B: MediaBackend + ?Sized> SegmentEncoder<'a, B> {
    pub fn new(
        backend: &'a B,
        source: &'a Path,
        options: &'a EncodingOptions,
        work_dir: &'a Path,
        job_id: &'a JobId,
    ) -> Self {
        Self {
            backend,
            source,
            options,
            work_dir,
            job_id,
            extension: source_extension(source),
        }
    }

    /// Output path for a descriptor.
    pub fn output_path(&self, descriptor: &SegmentDescriptor) -> PathBuf {
        segment_output_path(self.work_dir, self.job_id, descriptor.number(), &self.extension)
    }

    /// Encode one segment.
    ///
    /// A non-zero exit, or an encode killed by the backend's timeout, is
    /// recorded as an error result. Any other backend error means the tool
    /// cannot run at all and is returned as `Err`.
    pub async fn encode(&self, descriptor: &SegmentDescriptor) -> MediaResult<SegmentResult> {
        let number = descriptor.number();
        let output = self.output_path(descriptor);
        let tool = self.backend.tool_name();

        info!(
            job_id = %self.job_id,
            split = number,
            start = %format_seconds(descriptor.start_secs),
            end = %format_seconds(descriptor.end_secs),
            output = %output.display(),
            "Encoding split {}", number
        );

        let result = self
            .backend
            .encode_range(
                self.source,
                descriptor.start_secs,
                descriptor.end_secs,
                self.options,
                &output,
            )
            .await;

        let message = match result {
            Ok(outcome) if outcome.is_success() => {
                info!(job_id = %self.job_id, split = number, "Successfully created split {}: {}", number, output.display());
                return Ok(SegmentResult::ok(output));
            }
            Ok(outcome) => {
                error!(
                    job_id = %self.job_id,
                    split = number,
                    exit_code = ?outcome.code,
                    "Error processing split {}: {}", number, outcome.diagnostics
                );
                format!("{} error: {}", tool, outcome.diagnostics.trim())
            }
            Err(e @ MediaError::Timeout(_)) => {
                error!(job_id = %self.job_id, split = number, "{} killed for split {}: {}", tool, number, e);
                format!("{} error: {}", tool, e)
            }
            Err(e) => {
                error!(job_id = %self.job_id, split = number, "Could not run {} for split {}: {}", tool, number, e);
                discard_partial_output(&output).await;
                return Err(e);
            }
        };

        discard_partial_output(&output).await;
        Ok(SegmentResult::failed(message))
    }
}

/// Remove whatever a failed encode left behind.
async fn discard_partial_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => info!("Removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
    }
}
