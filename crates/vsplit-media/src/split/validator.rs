//! Segment validation.
//!
//! Turns raw start/end strings into clamped second offsets. A request is
//! either accepted as a [`SegmentDescriptor`] or rejected with the message
//! that ends up in its result slot; one bad request never affects another.

use tracing::warn;

use vsplit_models::{parse_timestamp, SegmentDescriptor, SegmentRequest};

/// Outcome of validating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Accepted(SegmentDescriptor),
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }
}

/// Message recorded for a request whose bounds collapse after clamping.
pub fn invalid_range_message(request: &SegmentRequest) -> String {
    format!(
        "Invalid split: start ({}) must be before end ({}) within duration",
        request.start, request.end
    )
}

/// Validate a single request at position `ordinal` against `duration_secs`.
pub fn validate_segment(
    ordinal: usize,
    request: &SegmentRequest,
    duration_secs: f64,
) -> ValidationOutcome {
    let number = ordinal + 1;

    let bounds = parse_timestamp(&request.start)
        .and_then(|start| parse_timestamp(&request.end).map(|end| (start, end)));
    let (mut start_secs, mut end_secs) = match bounds {
        Ok(bounds) => bounds,
        Err(e) => {
            warn!(split = number, "Error processing split {}: {}. Skipping.", number, e);
            return ValidationOutcome::Rejected(e.to_string());
        }
    };

    if start_secs < 0.0 {
        warn!(
            split = number,
            "Split {} start time {} is negative, using 0 instead", number, request.start
        );
        start_secs = 0.0;
    }
    if end_secs > duration_secs {
        warn!(
            split = number,
            "Split {} end time {} exceeds file duration, using file duration instead",
            number,
            request.end
        );
        end_secs = duration_secs;
    }

    if start_secs < end_secs {
        ValidationOutcome::Accepted(SegmentDescriptor {
            ordinal,
            start_secs,
            end_secs,
            source: request.clone(),
        })
    } else {
        ValidationOutcome::Rejected(invalid_range_message(request))
    }
}

/// Validate every request; the output is aligned with `requests`.
pub fn validate_segments(requests: &[SegmentRequest], duration_secs: f64) -> Vec<ValidationOutcome> {
    requests
        .iter()
        .enumerate()
        .map(|(ordinal, request)| validate_segment(ordinal, request, duration_secs))
        .collect()
}
