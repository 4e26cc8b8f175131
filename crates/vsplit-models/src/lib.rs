//! Shared data models for the vsplit workspace.
//!
//! This crate provides Serde-serializable types for:
//! - Timestamp parsing
//! - Segment requests, descriptors and results
//! - Encoding options
//! - Split jobs and their responses

pub mod encoding;
pub mod job;
pub mod segment;
pub mod timestamp;

// Re-export common types
pub use encoding::{EncodingError, EncodingOptions};
pub use job::{JobId, JobOutcome, JobValidationError, SplitJob, SplitResponseItem, SPLIT_ENDPOINT};
pub use segment::{SegmentDescriptor, SegmentRequest, SegmentResult, SegmentResults, SegmentStatus};
pub use timestamp::{format_seconds, parse_timestamp, TimestampError};
