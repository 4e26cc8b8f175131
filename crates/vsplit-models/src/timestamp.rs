//! Timestamp parsing utilities.
//!
//! Split requests carry human-entered offsets in one of three shapes:
//! `H:MM:SS[.mmm]`, `MM:SS[.mmm]`, or bare seconds. Hours and minutes are
//! whole numbers; seconds may be fractional.

use thiserror::Error;

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    /// The string does not match any accepted shape, or a field is not numeric.
    #[error("Invalid time format: {0}. Expected HH:MM:SS[.mmm]")]
    InvalidFormat(String),
}

/// Parse a timestamp string to total seconds.
///
/// Negative values are returned as-is; range checks belong to the caller.
///
/// # Examples
/// ```
/// use vsplit_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:02:03.5").unwrap(), 3723.5);
/// assert_eq!(parse_timestamp("02:30").unwrap(), 150.0);
/// assert_eq!(parse_timestamp("45").unwrap(), 45.0);
/// assert!(parse_timestamp("abc").is_err());
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let invalid = || TimestampError::InvalidFormat(ts.to_string());
    let trimmed = ts.trim();

    let parts: Vec<&str> = trimmed.split(':').collect();
    match parts.as_slice() {
        [hours, minutes, seconds] => {
            let hours: i64 = hours.trim().parse().map_err(|_| invalid())?;
            let minutes: i64 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds = parse_seconds(seconds).ok_or_else(invalid)?;
            Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
        }
        [minutes, seconds] => {
            let minutes: i64 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds = parse_seconds(seconds).ok_or_else(invalid)?;
            Ok(minutes as f64 * 60.0 + seconds)
        }
        [seconds] => parse_seconds(seconds).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Parse a seconds field, rejecting NaN and infinities that `f64::from_str` accepts.
fn parse_seconds(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}
