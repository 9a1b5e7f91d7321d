//! Error types for input validation and model construction.

use thiserror::Error;

/// A malformed time token or range string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The token is not a recognizable clock time.
    #[error("invalid time `{token}`: {reason}")]
    InvalidToken { token: String, reason: &'static str },
    /// The range does not split into exactly two time tokens.
    #[error("invalid time range `{0}`: expected `HH:MM-HH:MM`")]
    MalformedRange(String),
    /// The range ends at or before its start.
    #[error("time range `{0}` ends at or before it starts")]
    Inverted(String),
}

impl TimeError {
    pub(crate) fn token(token: &str, reason: &'static str) -> Self {
        TimeError::InvalidToken {
            token: token.to_string(),
            reason,
        }
    }
}

/// Errors that abort a scheduling run before (or instead of) solving.
///
/// Shortfalls in coverage are never reported here; they surface as slack in
/// the result.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("day `{day}`: opening hours: {source}")]
    DayWindow {
        day: String,
        #[source]
        source: TimeError,
    },
    #[error("day `{day}`: peak {index}: {source}")]
    Peak {
        day: String,
        index: usize,
        #[source]
        source: TimeError,
    },
    #[error("worker `{worker}`: availability on `{day}`: {source}")]
    Availability {
        worker: String,
        day: String,
        #[source]
        source: TimeError,
    },
    #[error("day `{day}`: negative demand {count} for role `{role}`")]
    NegativeDemand { day: String, role: String, count: i64 },
    #[error("worker `{worker}`: max_hours must not be negative (got {hours})")]
    NegativeCapacity { worker: String, hours: f64 },
    #[error("worker name `{0}` appears more than once")]
    DuplicateWorker(String),
    #[error("day `{0}` is configured more than once")]
    DuplicateDay(String),
    #[error("worker at position {0} has an empty name")]
    UnnamedWorker(usize),
    #[error("invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid single-day payload: {0}")]
    InvalidPayload(String),
    #[error("model does not fit 32-bit solver domains: {0}")]
    ModelOverflow(String),
    #[error("solve task failed: {0}")]
    Interrupted(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_offending_value() {
        let err = ScheduleError::Availability {
            worker: "Asha".to_string(),
            day: "monday".to_string(),
            source: TimeError::token("25:00", "hour out of range"),
        };
        let text = err.to_string();
        assert!(text.contains("Asha"));
        assert!(text.contains("monday"));

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("invalid time `25:00`: hour out of range")
        );
    }
}
