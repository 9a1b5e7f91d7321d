//! Clock-time parsing for opening hours, peaks, and availability windows.
//!
//! All times are minutes since midnight. `24:00` is accepted as the end of
//! the day so that a shop closing at midnight can be expressed.

use chrono::{NaiveTime, Timelike};
use std::fmt;

use crate::error::TimeError;

/// Minutes in a day; also the value of `24:00`.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Parses a clock time such as `"09:00"`, `"9am"`, `"21.30"` or `"17"`.
///
/// ```
/// use staff_scheduling::time::parse_time_token;
///
/// assert_eq!(parse_time_token("9am"), Ok(9 * 60));
/// assert_eq!(parse_time_token("21.30"), Ok(21 * 60 + 30));
/// assert!(parse_time_token("25:00").is_err());
/// ```
pub fn parse_time_token(token: &str) -> Result<u32, TimeError> {
    let cleaned: String = token
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '.' { ':' } else { c })
        .collect();

    let (clock, meridiem) = if let Some(rest) = cleaned.strip_suffix("am") {
        (rest, Some(Meridiem::Am))
    } else if let Some(rest) = cleaned.strip_suffix("pm") {
        (rest, Some(Meridiem::Pm))
    } else {
        (cleaned.as_str(), None)
    };

    if clock.is_empty() {
        return Err(TimeError::token(token, "empty time"));
    }

    let (hh, mm) = clock.split_once(':').unwrap_or((clock, "00"));
    if hh.is_empty() || hh.len() > 2 || !hh.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::token(token, "hour must be one or two digits"));
    }
    if mm.len() != 2 || !mm.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::token(token, "minutes must be two digits"));
    }

    let hour: u32 = hh
        .parse()
        .map_err(|_| TimeError::token(token, "hour is not a number"))?;
    let minute: u32 = mm
        .parse()
        .map_err(|_| TimeError::token(token, "minutes are not a number"))?;

    let hour = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return Err(TimeError::token(token, "12-hour clock hour must be 1-12"));
            }
            match m {
                Meridiem::Am => hour % 12,
                Meridiem::Pm => hour % 12 + 12,
            }
        }
        None => hour,
    };

    if hour == 24 && minute == 0 {
        return Ok(MINUTES_PER_DAY);
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(|t| t.num_seconds_from_midnight() / 60)
        .ok_or_else(|| TimeError::token(token, "not a valid time of day"))
}

/// A half-open interval of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Parses both bounds from separate tokens.
    pub fn from_bounds(start: &str, end: &str) -> Result<Self, TimeError> {
        Ok(Self::new(parse_time_token(start)?, parse_time_token(end)?))
    }

    /// Rejects ranges that end at or before their start.
    pub fn ensure_ordered(self) -> Result<Self, TimeError> {
        if self.end <= self.start {
            Err(TimeError::Inverted(self.to_string()))
        } else {
            Ok(self)
        }
    }

    /// Length in minutes (zero for inverted ranges).
    pub fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// The part of `self` inside `window`, if any.
    pub fn clamp_to(&self, window: &TimeRange) -> Option<TimeRange> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        (end > start).then_some(TimeRange { start, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Parses `"A-B"` or `"A to B"`.
///
/// Bounds are not checked for order here; callers validate with
/// [`TimeRange::ensure_ordered`].
pub fn parse_time_range(text: &str) -> Result<TimeRange, TimeError> {
    let lowered = text.to_lowercase().replace("to", "-");
    let parts: Vec<&str> = lowered
        .split('-')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match parts.as_slice() {
        [start, end] => Ok(TimeRange::new(
            parse_time_token(start)?,
            parse_time_token(end)?,
        )),
        _ => Err(TimeError::MalformedRange(text.to_string())),
    }
}

/// Renders minutes since midnight as `HH:MM`.
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_24_hour_tokens() {
        assert_eq!(parse_time_token("09:00"), Ok(540));
        assert_eq!(parse_time_token(" 17:45 "), Ok(17 * 60 + 45));
        assert_eq!(parse_time_token("21.00"), Ok(21 * 60));
        assert_eq!(parse_time_token("7"), Ok(7 * 60));
        assert_eq!(parse_time_token("24:00"), Ok(MINUTES_PER_DAY));
        assert_eq!(parse_time_token("00:00"), Ok(0));
    }

    #[test]
    fn test_parse_meridiem_tokens() {
        assert_eq!(parse_time_token("9am"), Ok(9 * 60));
        assert_eq!(parse_time_token("9 PM"), Ok(21 * 60));
        assert_eq!(parse_time_token("12am"), Ok(0));
        assert_eq!(parse_time_token("12pm"), Ok(12 * 60));
        assert_eq!(parse_time_token("5.30pm"), Ok(17 * 60 + 30));
        assert!(parse_time_token("13pm").is_err());
        assert!(parse_time_token("0am").is_err());
    }

    #[test]
    fn test_reject_malformed_tokens() {
        for bad in ["", "25:00", "24:30", "9:5", "nine", "10:60", "123", "am"] {
            assert!(parse_time_token(bad).is_err(), "accepted `{}`", bad);
        }
    }

    #[test]
    fn test_parse_ranges() {
        assert_eq!(parse_time_range("09:00-17:00"), Ok(TimeRange::new(540, 1020)));
        assert_eq!(parse_time_range("9am to 5pm"), Ok(TimeRange::new(540, 1020)));
        assert_eq!(parse_time_range("10 - 12"), Ok(TimeRange::new(600, 720)));
        assert_eq!(
            parse_time_range("09:00"),
            Err(TimeError::MalformedRange("09:00".to_string()))
        );
        assert!(parse_time_range("09:00-12:00-13:00").is_err());
    }

    #[test]
    fn test_out_of_range_hours_fail_in_range() {
        let err = parse_time_range("25:00-26:00").unwrap_err();
        assert!(err.to_string().contains("25:00"));
    }

    #[test]
    fn test_equal_bounds_parse_but_fail_validation() {
        let range = parse_time_range("10:00-10:00").unwrap();
        assert_eq!(range.duration(), 0);
        assert_eq!(
            range.ensure_ordered(),
            Err(TimeError::Inverted("10:00-10:00".to_string()))
        );
        assert!(parse_time_range("17:00-09:00")
            .unwrap()
            .ensure_ordered()
            .is_err());
    }

    #[test]
    fn test_clamp_to_window() {
        let window = TimeRange::new(540, 1020);
        assert_eq!(
            TimeRange::new(480, 600).clamp_to(&window),
            Some(TimeRange::new(540, 600))
        );
        assert_eq!(TimeRange::new(1020, 1100).clamp_to(&window), None);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "00:00");
        assert_eq!(format_minutes(9 * 60 + 5), "09:05");
        assert_eq!(format_minutes(MINUTES_PER_DAY), "24:00");
        assert_eq!(TimeRange::new(540, 1020).to_string(), "09:00-17:00");
    }
}
