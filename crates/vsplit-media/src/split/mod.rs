//! Segment split pipeline.
//!
//! - [`validator`]: timestamp parsing, clamping and range checks
//! - [`encoder`]: one external encode per accepted segment
//! - [`orchestrator`]: acquisition, sequencing and result assembly
//! - [`cleanup`]: scoped removal of job artifacts

pub mod cleanup;
pub mod encoder;
pub mod orchestrator;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_fixtures;
#[cfg(test)]
mod tests;

pub use cleanup::CleanupGuard;
pub use encoder::{segment_output_path, source_extension, SegmentEncoder};
pub use orchestrator::{SplitOrchestrator, SplitOutput, SplitRequest};
pub use validator::{validate_segment, validate_segments, ValidationOutcome};
