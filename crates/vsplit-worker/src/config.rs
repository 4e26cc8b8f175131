//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Local storage shared by all jobs; artifacts are prefixed with the job id
    pub work_dir: PathBuf,
    /// Kill a single segment encode after this long (`None` = unbounded)
    pub encode_timeout: Option<Duration>,
    /// Overall timeout for fetching the source media
    pub download_timeout: Duration,
    /// Upper bound on one whole split (fetch, probe and every encode)
    pub job_timeout: Duration,
    /// Upload retry attempts after the first failure
    pub upload_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/vsplit"),
            encode_timeout: Some(Duration::from_secs(1800)),
            download_timeout: Duration::from_secs(1800),
            job_timeout: Duration::from_secs(3600), // 1 hour
            upload_retries: 3,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|s| parse_trimmed::<u64>(&s));

        Self {
            work_dir: lookup("WORKER_WORK_DIR")
                .or_else(|| lookup("LOCAL_STORAGE_PATH"))
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            // 0 disables the per-encode limit
            encode_timeout: match parsed("WORKER_ENCODE_TIMEOUT") {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.encode_timeout,
            },
            download_timeout: parsed("WORKER_DOWNLOAD_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.download_timeout),
            job_timeout: parsed("WORKER_JOB_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.job_timeout),
            upload_retries: lookup("WORKER_UPLOAD_RETRIES")
                .and_then(|s| parse_trimmed(&s))
                .unwrap_or(defaults.upload_retries),
        }
    }
}

fn parse_trimmed<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}
