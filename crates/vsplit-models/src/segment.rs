//! Segment request and result models.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Error recorded in every result slot before processing reaches it.
pub const UNPROCESSED: &str = "Unprocessed";

/// A requested cut, exactly as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SegmentRequest {
    /// Start timestamp (`HH:MM:SS[.mmm]`, `MM:SS[.mmm]` or seconds)
    pub start: String,
    /// End timestamp
    pub end: String,
}

impl SegmentRequest {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// A request that passed validation, with normalized bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentDescriptor {
    /// 0-based position of the request in the caller's list
    pub ordinal: usize,
    /// Clamped start in seconds
    pub start_secs: f64,
    /// Clamped end in seconds
    pub end_secs: f64,
    /// The request this descriptor was derived from
    pub source: SegmentRequest,
}

impl SegmentDescriptor {
    /// 1-based split number used for artifact names and log lines.
    pub fn number(&self) -> usize {
        self.ordinal + 1
    }

    /// Length of the cut in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Outcome of a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Ok,
    Error,
}

/// Result for one requested segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentResult {
    pub status: SegmentStatus,
    /// Local artifact path, set only when `status` is `ok`
    pub output_path: Option<PathBuf>,
    /// Failure reason, set only when `status` is `error`
    pub error: Option<String>,
}

impl SegmentResult {
    /// Placeholder for a slot nothing has touched yet.
    pub fn unprocessed() -> Self {
        Self::failed(UNPROCESSED)
    }

    pub fn ok(output_path: impl Into<PathBuf>) -> Self {
        Self {
            status: SegmentStatus::Ok,
            output_path: Some(output_path.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: SegmentStatus::Error,
            output_path: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SegmentStatus::Ok
    }
}

/// Fixed-length, index-addressed result collection.
///
/// The length is decided once from the request count and never changes:
/// slots are overwritten by ordinal, never pushed, so `results[i]` always
/// belongs to `requests[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SegmentResults(Vec<SegmentResult>);

impl SegmentResults {
    /// Allocate `len` slots, all marked unprocessed.
    pub fn unprocessed(len: usize) -> Self {
        Self(vec![SegmentResult::unprocessed(); len])
    }

    /// Overwrite the slot for `ordinal`.
    ///
    /// # Panics
    /// Panics if `ordinal` is out of range; ordinals come from enumerating the
    /// same request list the collection was sized from.
    pub fn set(&mut self, ordinal: usize, result: SegmentResult) {
        self.0[ordinal] = result;
    }

    pub fn get(&self, ordinal: usize) -> Option<&SegmentResult> {
        self.0.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentResult> {
        self.0.iter()
    }

    /// Paths of every successfully produced artifact, in ordinal order.
    pub fn ok_outputs(&self) -> impl Iterator<Item = &Path> {
        self.0
            .iter()
            .filter(|r| r.is_ok())
            .filter_map(|r| r.output_path.as_deref())
    }

    pub fn into_vec(self) -> Vec<SegmentResult> {
        self.0
    }
}

impl<'a> IntoIterator for &'a SegmentResults {
    type Item = &'a SegmentResult;
    type IntoIter = std::slice::Iter<'a, SegmentResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
