//! Video split worker.
//!
//! This crate provides:
//! - Worker configuration from the environment
//! - Split job execution: upload of produced segments and local cleanup
//! - Upload retry with exponential backoff
//! - Structured job logging

pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod split_job;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{JobLogger, PublishSummary, OPERATION};
pub use retry::{retry_async, RetryConfig, RetryResult};
pub use split_job::{read_job, SplitJobRunner};
