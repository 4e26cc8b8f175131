//! FFprobe container duration.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{MediaError, MediaResult};

/// Duration assumed when the real one cannot be read (24 hours).
///
/// Large enough that the end-of-media clamp never triggers, so an
/// unreadable duration degrades to "trust the caller's end times".
pub const FALLBACK_DURATION_SECS: f64 = 86400.0;

/// Read the container-level duration of a local media file, in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    probe_duration_with("ffprobe", path).await
}

/// Same as [`probe_duration`] with an explicit ffprobe executable.
pub async fn probe_duration_with(
    program: impl AsRef<Path>,
    path: impl AsRef<Path>,
) -> MediaResult<f64> {
    let program = program.as_ref();
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which(program).map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new(program)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse ffprobe's bare `format=duration` value.
pub fn parse_duration_output(stdout: &str) -> MediaResult<f64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| MediaError::InvalidDuration(trimmed.to_string()))
}

/// Resolve a probe result to a usable duration, never failing.
pub fn duration_or_fallback(result: MediaResult<f64>) -> f64 {
    match result {
        Ok(duration) => {
            info!("File duration: {} seconds", duration);
            duration
        }
        Err(e) => {
            warn!(
                error = %e,
                fallback_secs = FALLBACK_DURATION_SECS,
                "Could not determine file duration, using a large value"
            );
            FALLBACK_DURATION_SECS
        }
    }
}

/// Probe with ffprobe from PATH, falling back to [`FALLBACK_DURATION_SECS`].
pub async fn probe_duration_or_fallback(path: impl AsRef<Path>) -> f64 {
    duration_or_fallback(probe_duration(path).await)
}
