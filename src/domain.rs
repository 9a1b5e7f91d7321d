//! Input model for staff scheduling: days, demand, and workers.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{ScheduleError, TimeError};
use crate::time::{parse_time_range, TimeRange};

/// Label used for single-day requests that do not name their day.
pub const DEFAULT_DAY_LABEL: &str = "day";

/// Weekly hour cap applied when a worker record omits one.
pub const DEFAULT_MAX_HOURS: f64 = 40.0;

fn default_max_hours() -> f64 {
    DEFAULT_MAX_HOURS
}

/// External identity of a worker, as issued by whatever store supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerId {
    Number(i64),
    Text(String),
}

/// One availability window in any of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Window {
    /// `"09:00-17:00"` or `"9am to 5pm"`.
    Text(String),
    /// `["09:00", "17:00"]`.
    Pair([String; 2]),
    /// `{"start": "09:00", "end": "17:00"}`.
    Bounds { start: String, end: String },
}

impl Window {
    pub fn parse(&self) -> Result<TimeRange, TimeError> {
        match self {
            Window::Text(text) => parse_time_range(text),
            Window::Pair([start, end]) | Window::Bounds { start, end } => {
                TimeRange::from_bounds(start, end)
            }
        }
    }
}

impl From<&str> for Window {
    fn from(text: &str) -> Self {
        Window::Text(text.to_string())
    }
}

/// A worker's availability, keyed by day or given as one flat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Availability {
    ByDay(BTreeMap<String, Vec<Window>>),
    Windows(Vec<Window>),
}

impl Default for Availability {
    fn default() -> Self {
        Availability::ByDay(BTreeMap::new())
    }
}

impl Availability {
    /// Windows that apply to `day` (a normalized label).
    ///
    /// A flat list applies to every day. With `merge_when_missing`, a keyed
    /// map without an entry for `day` contributes the windows of all its days.
    pub fn windows_for(&self, day: &str, merge_when_missing: bool) -> Vec<&Window> {
        match self {
            Availability::Windows(windows) => windows.iter().collect(),
            Availability::ByDay(by_day) => {
                let matching: Vec<&Window> = by_day
                    .iter()
                    .filter(|(label, _)| normalize_day_label(label) == day)
                    .flat_map(|(_, windows)| windows.iter())
                    .collect();
                if matching.is_empty() && merge_when_missing {
                    by_day.values().flatten().collect()
                } else {
                    matching
                }
            }
        }
    }
}

/// A time-bounded addition to a day's base demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub extra: BTreeMap<String, i64>,
}

/// Opening hours and staffing demand for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayConfig {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub roles: BTreeMap<String, i64>,
    #[serde(default)]
    pub peaks: Vec<Peak>,
}

impl DayConfig {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            roles: BTreeMap::new(),
            peaks: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>, count: i64) -> Self {
        self.roles.insert(role.into(), count);
        self
    }

    pub fn with_peak(
        mut self,
        start: impl Into<String>,
        end: impl Into<String>,
        extra: impl IntoIterator<Item = (&'static str, i64)>,
    ) -> Self {
        self.peaks.push(Peak {
            start: start.into(),
            end: end.into(),
            extra: extra.into_iter().map(|(r, n)| (r.to_string(), n)).collect(),
        });
        self
    }
}

/// A worker who can be assigned to slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkerId>,
    pub name: String,
    /// Qualified roles; empty means qualified for every role.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default = "default_max_hours", alias = "max_weekly_hours")]
    pub max_hours: f64,
    /// Hours already worked earlier in the week (single-day mode).
    #[serde(default, alias = "prev_hours")]
    pub prior_hours: f64,
    #[serde(default)]
    pub availability: Availability,
}

impl Worker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            roles: Vec::new(),
            max_hours: DEFAULT_MAX_HOURS,
            prior_hours: 0.0,
            availability: Availability::default(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(WorkerId::Number(id));
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_hours(mut self, hours: f64) -> Self {
        self.max_hours = hours;
        self
    }

    pub fn with_prior_hours(mut self, hours: f64) -> Self {
        self.prior_hours = hours;
        self
    }

    /// Replaces availability with one flat list that applies to every day.
    pub fn with_windows(mut self, windows: &[&str]) -> Self {
        self.availability = Availability::Windows(windows.iter().map(|w| Window::from(*w)).collect());
        self
    }

    /// Adds windows for `day`, switching a flat list to a keyed map if needed.
    pub fn available(mut self, day: impl Into<String>, windows: &[&str]) -> Self {
        let windows = windows.iter().map(|w| Window::from(*w));
        match &mut self.availability {
            Availability::ByDay(by_day) => by_day.entry(day.into()).or_default().extend(windows),
            Availability::Windows(_) => {
                let mut by_day = BTreeMap::new();
                by_day.insert(day.into(), windows.collect());
                self.availability = Availability::ByDay(by_day);
            }
        }
        self
    }
}

/// A multi-day scheduling request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleInput {
    #[serde(default, alias = "week")]
    pub days: BTreeMap<String, DayConfig>,
    #[serde(default, alias = "employees")]
    pub workers: Vec<Worker>,
}

impl ScheduleInput {
    pub fn new(workers: Vec<Worker>) -> Self {
        Self {
            days: BTreeMap::new(),
            workers,
        }
    }

    pub fn with_day(mut self, label: impl Into<String>, config: DayConfig) -> Self {
        self.days.insert(label.into(), config);
        self
    }
}

/// A request covering exactly one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleDayRequest {
    #[serde(default = "default_day_label")]
    pub day_label: String,
    pub day: DayConfig,
    #[serde(default, alias = "employees")]
    pub workers: Vec<Worker>,
}

fn default_day_label() -> String {
    DEFAULT_DAY_LABEL.to_string()
}

impl SingleDayRequest {
    pub fn new(day_label: impl Into<String>, day: DayConfig, workers: Vec<Worker>) -> Self {
        Self {
            day_label: normalize_day_label(&day_label.into()),
            day,
            workers,
        }
    }

    /// Builds a request from any of the accepted payload shapes.
    ///
    /// Accepts `{day, workers}`, `{week, workers}` (picking `label`, or the
    /// first day in weekday order), or a flattened
    /// `{open, close, roles, peaks?, workers}` object.
    pub fn from_value(value: Value, label: Option<&str>) -> Result<Self, ScheduleError> {
        let Value::Object(mut body) = value else {
            return Err(ScheduleError::InvalidPayload(
                "expected a JSON object".to_string(),
            ));
        };

        let workers: Vec<Worker> = match body.remove("workers").or_else(|| body.remove("employees")) {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };
        let wanted = label.map(normalize_day_label);

        if let Some(day) = body.remove("day") {
            let day: DayConfig = serde_json::from_value(day)?;
            let day_label = wanted.unwrap_or_else(default_day_label);
            return Ok(Self { day_label, day, workers });
        }

        if let Some(week) = body.remove("week").or_else(|| body.remove("days")) {
            let week: BTreeMap<String, DayConfig> = serde_json::from_value(week)?;
            let mut week = normalize_days(week)?;
            let pick = match wanted {
                Some(label) if week.contains_key(&label) => label,
                _ => order_day_labels(week.keys())
                    .into_iter()
                    .next()
                    .ok_or_else(|| ScheduleError::InvalidPayload("week has no days".to_string()))?,
            };
            let day = week
                .remove(&pick)
                .ok_or_else(|| ScheduleError::InvalidPayload(format!("day `{}` missing", pick)))?;
            return Ok(Self {
                day_label: pick,
                day,
                workers,
            });
        }

        if ["open", "close", "roles"].iter().all(|k| body.contains_key(*k)) {
            let day: DayConfig = serde_json::from_value(Value::Object(body))?;
            let day_label = wanted.unwrap_or_else(default_day_label);
            return Ok(Self { day_label, day, workers });
        }

        Err(ScheduleError::InvalidPayload(
            "provide {day, workers}, {week, workers}, or a flattened {open, close, roles, workers} object"
                .to_string(),
        ))
    }
}

/// Trims and lowercases a day label, expanding weekday abbreviations.
///
/// ```
/// use staff_scheduling::domain::normalize_day_label;
///
/// assert_eq!(normalize_day_label(" Mon "), "monday");
/// assert_eq!(normalize_day_label("thurs"), "thursday");
/// assert_eq!(normalize_day_label("2025-09-26"), "2025-09-26");
/// ```
pub fn normalize_day_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    let canonical = match lowered.as_str() {
        "tues" => "tue",
        "weds" => "wed",
        "thur" | "thurs" => "thu",
        other => other,
    };
    match canonical.parse::<Weekday>() {
        Ok(day) => weekday_name(day).to_string(),
        Err(_) => lowered,
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Orders labels Monday first; non-weekday labels follow alphabetically.
pub fn order_day_labels<'a>(labels: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut labels: Vec<String> = labels.into_iter().cloned().collect();
    labels.sort_by_key(|label| {
        let rank = label
            .parse::<Weekday>()
            .map(|d| d.num_days_from_monday())
            .unwrap_or(7);
        (rank, label.clone())
    });
    labels
}

/// Re-keys a day map by normalized label.
pub fn normalize_days(
    days: BTreeMap<String, DayConfig>,
) -> Result<BTreeMap<String, DayConfig>, ScheduleError> {
    let mut normalized = BTreeMap::new();
    for (label, config) in days {
        let key = normalize_day_label(&label);
        if normalized.insert(key.clone(), config).is_some() {
            return Err(ScheduleError::DuplicateDay(key));
        }
    }
    Ok(normalized)
}
