#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for segment splitting.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-aware runner
//! - Duration probing through ffprobe with a permissive fallback
//! - Source acquisition over HTTP(S) or from local `file://` references
//! - The split pipeline: validation, sequential encoding and cleanup

pub mod backend;
pub mod command;
pub mod download;
pub mod error;
pub mod probe;
pub mod split;

pub use backend::{build_segment_command, FfmpegBackend, MediaBackend};
pub use command::{check_ffmpeg, check_ffprobe, ExitOutcome, FfmpegCommand, FfmpegRunner};
pub use download::{extension_from_url, HttpSourceFetcher, SourceFetcher};
pub use error::{MediaError, MediaResult};
pub use probe::{
    duration_or_fallback, probe_duration, probe_duration_or_fallback, FALLBACK_DURATION_SECS,
};
pub use split::{
    CleanupGuard, SegmentEncoder, SplitOrchestrator, SplitOutput, SplitRequest, ValidationOutcome,
};
