//! Duration input parsing

use thiserror::Error;

/// Largest duration the timer accepts, in seconds (59m 59s)
pub const MAX_DURATION_SECONDS: u32 = 3599;

/// Reasons a duration input could not be read as a number of seconds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("duration input {0:?} is not a number")]
    NotANumber(String),
    #[error("duration input {0:?} is negative")]
    Negative(String),
}

/// Parse user-entered text into whole seconds.
///
/// Empty input means zero. Fractional values are floored and anything at or
/// above one hour is clamped to [`MAX_DURATION_SECONDS`].
pub fn parse_duration(input: &str) -> Result<u32, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| DurationParseError::NotANumber(input.to_string()))?;

    if value.is_nan() {
        return Err(DurationParseError::NotANumber(input.to_string()));
    }
    if value < 0.0 {
        return Err(DurationParseError::Negative(input.to_string()));
    }
    if value >= f64::from(MAX_DURATION_SECONDS + 1) {
        return Ok(MAX_DURATION_SECONDS);
    }

    // In range [0, 3600), so the cast cannot truncate anything but the fraction
    Ok(value.floor() as u32)
}
