//! Media tool backend.
//!
//! The split pipeline only needs two things from the transcoding tool: the
//! duration of a file and a bounded re-encode of a time range. Keeping them
//! behind [`MediaBackend`] lets the orchestration run against fakes in tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use vsplit_models::EncodingOptions;

use crate::command::{ExitOutcome, FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::probe::probe_duration_with;

/// External probe/encode operations used by the split pipeline.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Name used as the prefix of encode failure messages (e.g. "FFmpeg").
    fn tool_name(&self) -> &str;

    /// Container duration of `path` in seconds.
    async fn probe_duration(&self, path: &Path) -> MediaResult<f64>;

    /// Re-encode `[start_secs, end_secs]` of `input` into `output`.
    ///
    /// A non-zero exit is reported through [`ExitOutcome`]; `Err` means the
    /// tool could not be run at all.
    async fn encode_range(
        &self,
        input: &Path,
        start_secs: f64,
        end_secs: f64,
        options: &EncodingOptions,
        output: &Path,
    ) -> MediaResult<ExitOutcome>;
}

/// FFmpeg/FFprobe command-line backend.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffprobe: PathBuf,
    runner: FfmpegRunner,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegBackend {
    /// Backend using `ffmpeg` and `ffprobe` from PATH, without a timeout.
    pub fn new() -> Self {
        Self {
            ffprobe: PathBuf::from("ffprobe"),
            runner: FfmpegRunner::new(),
        }
    }

    /// Override the executables.
    pub fn with_programs(mut self, ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        self.runner = self.runner.with_program(ffmpeg);
        self.ffprobe = ffprobe.into();
        self
    }

    /// Kill any single encode that runs longer than `secs`.
    pub fn with_encode_timeout(mut self, secs: u64) -> Self {
        self.runner = self.runner.with_timeout(secs);
        self
    }
}

/// Build the per-segment encode command.
pub fn build_segment_command(
    input: &Path,
    start_secs: f64,
    end_secs: f64,
    options: &EncodingOptions,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(input, output)
        .seek(start_secs)
        .to(end_secs)
        .video_codec(&options.video_codec)
        .preset(&options.video_preset)
        .crf(options.video_crf)
        .audio_codec(&options.audio_codec)
        .audio_bitrate(&options.audio_bitrate)
        .avoid_negative_ts()
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    fn tool_name(&self) -> &str {
        "FFmpeg"
    }

    async fn probe_duration(&self, path: &Path) -> MediaResult<f64> {
        probe_duration_with(&self.ffprobe, path).await
    }

    async fn encode_range(
        &self,
        input: &Path,
        start_secs: f64,
        end_secs: f64,
        options: &EncodingOptions,
        output: &Path,
    ) -> MediaResult<ExitOutcome> {
        let cmd = build_segment_command(input, start_secs, end_secs, options, output);
        self.runner.run_capture(&cmd).await
    }
}
