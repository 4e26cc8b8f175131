//! Scoped cleanup of split artifacts.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Deletes every tracked file when dropped, unless disarmed first.
///
/// The fetcher tracks the download destination until the body is complete;
/// the orchestrator tracks the acquired source and each segment output as
/// its encode starts. Any exit other than the final successful return (an
/// early `?`, a panic, or the caller dropping the future) removes them.
#[derive(Debug)]
pub struct CleanupGuard {
    paths: Vec<PathBuf>,
    armed: bool,
}

impl Default for CleanupGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            armed: true,
        }
    }

    /// Add a file to delete on abnormal exit.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Hand ownership of the tracked files to the caller.
    pub fn disarm(mut self) -> Vec<PathBuf> {
        self.armed = false;
        std::mem::take(&mut self.paths)
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in &self.paths {
            remove_quietly(path);
        }
    }
}

/// Best-effort synchronous removal; `Drop` cannot await.
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
