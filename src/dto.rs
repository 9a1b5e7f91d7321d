//! Output records for a scheduling run.
//!
//! All maps are keyed by day label, role name, or worker name. Times are
//! `HH:MM` strings at slot granularity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::WorkerId;

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    /// The solver proved the schedule optimal.
    Optimal,
    /// The time budget ran out with a schedule in hand.
    Feasible,
    /// No schedule exists, or none was found in time.
    Infeasible,
    /// The request named no days.
    NoDays,
    /// The request named no workers.
    NoEmployees,
}

impl ScheduleStatus {
    /// Returns the status as it appears in JSON output.
    ///
    /// ```
    /// use staff_scheduling::dto::ScheduleStatus;
    ///
    /// assert_eq!(ScheduleStatus::Optimal.as_str(), "OPTIMAL");
    /// assert_eq!(ScheduleStatus::NoEmployees.as_str(), "NO_EMPLOYEES");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleStatus::Optimal => "OPTIMAL",
            ScheduleStatus::Feasible => "FEASIBLE",
            ScheduleStatus::Infeasible => "INFEASIBLE",
            ScheduleStatus::NoDays => "NO_DAYS",
            ScheduleStatus::NoEmployees => "NO_EMPLOYEES",
        }
    }

    /// Whether a schedule accompanies this status.
    pub fn has_schedule(self) -> bool {
        matches!(self, ScheduleStatus::Optimal | ScheduleStatus::Feasible)
    }
}

/// An occupied stretch of a day, pooled over roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBlock {
    pub start: String,
    pub end: String,
    /// Present when every contributing block had the same role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupCandidate {
    pub id: Option<WorkerId>,
    pub name: String,
}

/// A maximal run of one role with a constant set of workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBlock {
    pub start: String,
    pub end: String,
    pub workers: Vec<String>,
    #[serde(default)]
    pub backups: Vec<BackupCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmetInterval {
    pub start: String,
    pub end: String,
    /// Largest shortfall in any slot of the interval.
    pub needed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayStatus {
    Covered,
    NotFullyCovered,
}

/// A role whose demand exceeds what qualified, available workers could cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDeficit {
    pub role: String,
    pub issue: String,
    pub demand_slots: u64,
    pub available_slots: u64,
    pub deficit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDiagnostics {
    pub status: DayStatus,
    /// Shortfall intervals by role, as in `unmet_demand`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unmet_intervals: BTreeMap<String, Vec<UnmetInterval>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<RoleDeficit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessSummary {
    pub min_hours: f64,
    pub max_hours: f64,
    pub hours_by_worker: BTreeMap<String, f64>,
    pub workers_used: usize,
    /// Sum of slack, in slot-role units.
    pub total_unmet: u64,
    /// Single-day mode only, floored to whole slots as the model counts it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_hours: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative_hours: Option<BTreeMap<String, f64>>,
}

/// Everything reported for a solved run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolvedSchedule {
    pub schedule: BTreeMap<String, Vec<DayBlock>>,
    pub by_role_assignments: BTreeMap<String, BTreeMap<String, Vec<RoleBlock>>>,
    pub attendance: BTreeMap<String, BTreeMap<String, Vec<Interval>>>,
    pub unmet_demand: BTreeMap<String, BTreeMap<String, Vec<UnmetInterval>>>,
    pub diagnostics: BTreeMap<String, DayDiagnostics>,
    pub fairness_summary: FairnessSummary,
}

/// Result of one run: a status, plus the schedule when there is one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub status: ScheduleStatus,
    #[serde(flatten)]
    pub schedule: Option<SolvedSchedule>,
}

impl ScheduleResult {
    /// A terminal status with nothing to report.
    pub fn bare(status: ScheduleStatus) -> Self {
        Self {
            status,
            schedule: None,
        }
    }

    pub fn solved(status: ScheduleStatus, schedule: SolvedSchedule) -> Self {
        Self {
            status,
            schedule: Some(schedule),
        }
    }
}
