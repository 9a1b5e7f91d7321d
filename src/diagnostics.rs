//! Structural explanations for unmet demand.
//!
//! These checks look only at demand, qualifications, and availability. Hour
//! caps and rest breaks are ignored, so a day can fall short with no
//! structural deficit at all.

use std::collections::BTreeMap;

use crate::dto::{DayDiagnostics, DayStatus, RoleDeficit, UnmetInterval};
use crate::problem::Problem;

const DEFICIT_ISSUE: &str = "insufficient availability or headcount";
const CAPACITY_NOTE: &str =
    "enough qualified workers are available; hour caps or rest breaks limited coverage";

/// Demand slots and qualified-available worker slots for one day and role.
pub fn structural_capacity(problem: &Problem, day: usize, role: usize) -> (u64, u64) {
    let slots = problem.horizon.days()[day].slots();
    let demand = slots
        .clone()
        .map(|s| u64::from(problem.demand(day, s, role)))
        .sum();
    let available = problem
        .workers
        .iter()
        .map(|w| slots.clone().filter(|&s| w.can_work(day, s, role)).count() as u64)
        .sum();
    (demand, available)
}

/// Coverage verdict for `day`, given its unmet intervals by role.
pub fn day_diagnostics(
    problem: &Problem,
    day: usize,
    unmet: &BTreeMap<String, Vec<UnmetInterval>>,
) -> DayDiagnostics {
    if unmet.is_empty() {
        return DayDiagnostics {
            status: DayStatus::Covered,
            unmet_intervals: BTreeMap::new(),
            reasons: Vec::new(),
            note: None,
        };
    }

    let reasons: Vec<RoleDeficit> = problem
        .horizon
        .roles()
        .names()
        .iter()
        .enumerate()
        .filter_map(|(r, role)| {
            let (demand_slots, available_slots) = structural_capacity(problem, day, r);
            (demand_slots > available_slots).then(|| RoleDeficit {
                role: role.clone(),
                issue: DEFICIT_ISSUE.to_string(),
                demand_slots,
                available_slots,
                deficit: demand_slots - available_slots,
            })
        })
        .collect();

    let note = reasons.is_empty().then(|| CAPACITY_NOTE.to_string());
    DayDiagnostics {
        status: DayStatus::NotFullyCovered,
        unmet_intervals: unmet.clone(),
        reasons,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DayConfig, SingleDayRequest, Worker};
    use crate::problem::Assembly;

    fn problem(day: DayConfig, workers: Vec<Worker>) -> Problem {
        match Problem::single_day(&SingleDayRequest::new("day", day, workers), 60).unwrap() {
            Assembly::Ready(problem) => problem,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn short(role: &str, start: &str, end: &str, needed: u32) -> BTreeMap<String, Vec<UnmetInterval>> {
        BTreeMap::from([(
            role.to_string(),
            vec![UnmetInterval {
                start: start.to_string(),
                end: end.to_string(),
                needed,
            }],
        )])
    }

    #[test]
    fn test_covered_day_has_no_reasons() {
        let p = problem(
            DayConfig::new("09:00", "17:00").with_role("cashier", 2),
            vec![Worker::new("Asha")],
        );
        let verdict = day_diagnostics(&p, 0, &BTreeMap::new());
        assert_eq!(verdict.status, DayStatus::Covered);
        assert!(verdict.unmet_intervals.is_empty());
        assert!(verdict.reasons.is_empty());
        assert!(verdict.note.is_none());
    }

    #[test]
    fn test_structural_deficit_per_role() {
        let p = problem(
            DayConfig::new("09:00", "17:00")
                .with_role("cashier", 2)
                .with_role("helper", 1),
            vec![
                Worker::new("Asha").with_windows(&["09:00-17:00"]).with_roles(["cashier"]),
                Worker::new("Jay").with_windows(&["09:00-17:00"]).with_roles(["helper"]),
            ],
        );
        assert_eq!(structural_capacity(&p, 0, 0), (16, 8));
        assert_eq!(structural_capacity(&p, 0, 1), (8, 8));

        let unmet = short("cashier", "09:00", "17:00", 1);
        let verdict = day_diagnostics(&p, 0, &unmet);
        assert_eq!(verdict.status, DayStatus::NotFullyCovered);
        assert_eq!(verdict.unmet_intervals, unmet);
        assert_eq!(
            verdict.reasons,
            vec![RoleDeficit {
                role: "cashier".to_string(),
                issue: "insufficient availability or headcount".to_string(),
                demand_slots: 16,
                available_slots: 8,
                deficit: 8,
            }]
        );
        assert!(verdict.note.is_none());
    }

    #[test]
    fn test_unavailable_worker_counts_no_slots() {
        let p = problem(
            DayConfig::new("09:00", "17:00").with_role("cashier", 1),
            vec![Worker::new("Asha").with_windows(&[])],
        );
        assert_eq!(structural_capacity(&p, 0, 0), (8, 0));
    }

    #[test]
    fn test_shortfall_without_structural_deficit_gets_note() {
        let p = problem(
            DayConfig::new("09:00", "17:00").with_role("cashier", 1),
            vec![Worker::new("Asha").with_windows(&["09:00-17:00"]).with_max_hours(4.0)],
        );
        let unmet = short("cashier", "13:00", "17:00", 1);
        let verdict = day_diagnostics(&p, 0, &unmet);
        assert_eq!(verdict.status, DayStatus::NotFullyCovered);
        assert_eq!(verdict.unmet_intervals["cashier"][0].start, "13:00");
        assert!(verdict.reasons.is_empty());
        assert!(verdict.note.unwrap().contains("hour caps"));

        let json = serde_json::to_value(day_diagnostics(&p, 0, &unmet)).unwrap();
        assert_eq!(json["unmet_intervals"]["cashier"][0]["needed"], 1);
    }
}
