//! Free-text plan durations such as `"1h30m"`, `"45m"` or `"2H"`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static HOURS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*h").expect("hours pattern is valid"));
static MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*m").expect("minutes pattern is valid"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DurationError {
    #[error("invalid plan duration: {raw:?}")]
    InvalidDuration { raw: String },
}

/// Parse a plan time into whole seconds.
///
/// The hour group and the minute group are extracted independently and each
/// defaults to zero when absent. A total of zero is rejected.
///
/// # Errors
///
/// Returns `DurationError::InvalidDuration` when the text yields zero seconds or a
/// component does not fit in the seconds range.
pub fn parse_time_to_seconds(raw: &str) -> Result<u32, DurationError> {
    let invalid = || DurationError::InvalidDuration {
        raw: raw.to_owned(),
    };

    let hours = capture(&HOURS, raw).ok_or_else(invalid)?;
    let minutes = capture(&MINUTES, raw).ok_or_else(invalid)?;

    let total = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .ok_or_else(invalid)?;

    if total == 0 {
        return Err(invalid());
    }
    Ok(total)
}

/// Returns `Some(0)` when the group is absent, `None` when it overflows.
fn capture(pattern: &Regex, raw: &str) -> Option<u32> {
    match pattern.captures(raw) {
        None => Some(0),
        Some(caps) => caps.get(1)?.as_str().parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_time_to_seconds("1h30m"), Ok(5400));
        assert_eq!(parse_time_to_seconds("45m"), Ok(2700));
        assert_eq!(parse_time_to_seconds("2h"), Ok(7200));
    }

    #[test]
    fn is_case_insensitive_and_order_free() {
        assert_eq!(parse_time_to_seconds("1H 15M"), Ok(4500));
        assert_eq!(parse_time_to_seconds("15m 1h"), Ok(4500));
    }

    #[test]
    fn rejects_zero_length_plans() {
        for raw in ["", "0h0m", "0m", "soon", "h m"] {
            assert!(
                matches!(
                    parse_time_to_seconds(raw),
                    Err(DurationError::InvalidDuration { .. })
                ),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overflowing_components() {
        assert!(parse_time_to_seconds("99999999999h").is_err());
        assert!(parse_time_to_seconds("2000000h").is_err());
    }
}
