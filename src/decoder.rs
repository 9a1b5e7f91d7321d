//! Turns solver values back into blocks, attendance, and shortfalls.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use crate::backups::rank_backups;
use crate::diagnostics::day_diagnostics;
use crate::dto::{
    DayBlock, FairnessSummary, Interval, RoleBlock, SolvedSchedule, UnmetInterval,
};
use crate::encoder::Encoding;
use crate::horizon::DaySpan;
use crate::model::Solution;
use crate::problem::{PlanningMode, Problem};

/// Solver values reduced to slot-level facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Role covered by `[worker][day][slot]`, if any.
    pub assignments: Vec<Vec<Vec<Option<usize>>>>,
    /// Unmet demand by `[day][slot][role]`.
    pub slack: Vec<Vec<Vec<u32>>>,
    /// Slots worked in the horizon, per worker.
    pub hours: Vec<u32>,
    pub min_basis: u32,
    pub max_basis: u32,
}

impl Decoded {
    pub fn is_busy(&self, worker: usize, day: usize, slot: usize) -> bool {
        self.assignments[worker][day][slot].is_some()
    }

    pub fn total_unmet(&self) -> u64 {
        self.slack.iter().flatten().flatten().map(|&s| u64::from(s)).sum()
    }
}

pub fn decode(problem: &Problem, encoding: &Encoding, values: &Solution) -> Decoded {
    let days = problem.horizon.days();
    let roles = problem.role_count();

    let assignments: Vec<Vec<Vec<Option<usize>>>> = (0..problem.worker_count())
        .map(|w| {
            days.iter()
                .enumerate()
                .map(|(d, day)| {
                    day.slots()
                        .map(|s| encoding.assigned_role(values, w, d, s))
                        .collect()
                })
                .collect()
        })
        .collect();

    let slack: Vec<Vec<Vec<u32>>> = days
        .iter()
        .enumerate()
        .map(|(d, day)| {
            day.slots()
                .map(|s| {
                    (0..roles)
                        .map(|r| values.value(encoding.slack(d, s, r)).max(0) as u32)
                        .collect()
                })
                .collect()
        })
        .collect();

    let hours: Vec<u32> = assignments
        .iter()
        .map(|by_day| by_day.iter().flatten().filter(|a| a.is_some()).count() as u32)
        .collect();

    Decoded {
        assignments,
        slack,
        hours,
        min_basis: values.value(encoding.min_basis).max(0) as u32,
        max_basis: values.value(encoding.max_basis).max(0) as u32,
    }
}

/// Maximal runs of equal consecutive values.
///
/// ```
/// use staff_scheduling::decoder::runs_of;
///
/// let runs = runs_of(&[1, 1, 2, 2, 2, 1]);
/// assert_eq!(runs, vec![(0..2, &1), (2..5, &2), (5..6, &1)]);
/// ```
pub fn runs_of<T: PartialEq>(values: &[T]) -> Vec<(Range<usize>, &T)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=values.len() {
        if i == values.len() || values[i] != values[start] {
            runs.push((start..i, &values[start]));
            start = i;
        }
    }
    runs
}

/// A run of slots with a constant, non-empty set of workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBlock {
    pub slots: Range<usize>,
    pub workers: Vec<String>,
}

/// Collapses per-slot worker sets for one role into blocks.
///
/// Slots nobody covers produce no block.
pub fn merge_role_blocks(sets: &[Vec<String>]) -> Vec<SlotBlock> {
    runs_of(sets)
        .into_iter()
        .filter(|(_, workers)| !workers.is_empty())
        .map(|(slots, workers)| SlotBlock {
            slots,
            workers: workers.clone(),
        })
        .collect()
}

/// An occupied stretch of a day, pooled across roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBlock {
    pub slots: Range<usize>,
    pub role: Option<String>,
    pub workers: Vec<String>,
}

/// Pools role blocks and merges the ones that overlap or touch.
pub fn merge_day_blocks(mut blocks: Vec<(String, SlotBlock)>) -> Vec<MergedBlock> {
    blocks.sort_by_key(|(_, b)| (b.slots.start, b.slots.end));

    let mut merged: Vec<(Range<usize>, BTreeSet<String>, BTreeSet<String>)> = Vec::new();
    for (role, block) in blocks {
        match merged.last_mut() {
            Some((slots, roles, workers)) if block.slots.start <= slots.end => {
                slots.end = slots.end.max(block.slots.end);
                roles.insert(role);
                workers.extend(block.workers);
            }
            _ => merged.push((
                block.slots,
                BTreeSet::from([role]),
                block.workers.into_iter().collect(),
            )),
        }
    }

    merged
        .into_iter()
        .map(|(slots, roles, workers)| MergedBlock {
            slots,
            role: if roles.len() == 1 {
                roles.into_iter().next()
            } else {
                None
            },
            workers: workers.into_iter().collect(),
        })
        .collect()
}

/// Runs of slots with unmet demand, each with its largest shortfall.
pub fn slack_runs(slack: &[u32]) -> Vec<(Range<usize>, u32)> {
    let short: Vec<bool> = slack.iter().map(|&s| s > 0).collect();
    runs_of(&short)
        .into_iter()
        .filter(|(_, is_short)| **is_short)
        .map(|(slots, _)| {
            let needed = slack[slots.clone()].iter().copied().max().unwrap_or(0);
            (slots, needed)
        })
        .collect()
}

/// Builds every output section from decoded values.
pub fn build_schedule(problem: &Problem, decoded: &Decoded, max_backups: usize) -> SolvedSchedule {
    let horizon = &problem.horizon;
    let span = |day: &DaySpan, slots: &Range<usize>| {
        (
            horizon.slot_label(day, slots.start),
            horizon.slot_label(day, slots.end),
        )
    };

    let mut schedule = BTreeMap::new();
    let mut by_role_assignments = BTreeMap::new();
    let mut unmet_demand = BTreeMap::new();
    let mut diagnostics = BTreeMap::new();

    for (d, day) in horizon.days().iter().enumerate() {
        let mut pooled = Vec::new();
        let mut role_blocks = BTreeMap::new();
        let mut unmet = BTreeMap::new();

        for (r, role) in horizon.roles().names().iter().enumerate() {
            let sets: Vec<Vec<String>> = day
                .slots()
                .map(|s| {
                    let mut names: Vec<String> = problem
                        .workers
                        .iter()
                        .enumerate()
                        .filter(|(w, _)| decoded.assignments[*w][d][s] == Some(r))
                        .map(|(_, worker)| worker.name.clone())
                        .collect();
                    names.sort();
                    names
                })
                .collect();

            let blocks = merge_role_blocks(&sets);
            if !blocks.is_empty() {
                let rendered: Vec<RoleBlock> = blocks
                    .iter()
                    .map(|block| {
                        let (start, end) = span(day, &block.slots);
                        RoleBlock {
                            start,
                            end,
                            workers: block.workers.clone(),
                            backups: rank_backups(problem, decoded, d, r, block, max_backups),
                        }
                    })
                    .collect();
                role_blocks.insert(role.clone(), rendered);
                pooled.extend(blocks.into_iter().map(|b| (role.clone(), b)));
            }

            let column: Vec<u32> = decoded.slack[d].iter().map(|by_role| by_role[r]).collect();
            let short: Vec<UnmetInterval> = slack_runs(&column)
                .into_iter()
                .map(|(slots, needed)| {
                    let (start, end) = span(day, &slots);
                    UnmetInterval { start, end, needed }
                })
                .collect();
            if !short.is_empty() {
                unmet.insert(role.clone(), short);
            }
        }

        let day_blocks: Vec<DayBlock> = merge_day_blocks(pooled)
            .into_iter()
            .map(|block| {
                let (start, end) = span(day, &block.slots);
                DayBlock {
                    start,
                    end,
                    role: block.role,
                    workers: block.workers,
                }
            })
            .collect();

        schedule.insert(day.label.clone(), day_blocks);
        by_role_assignments.insert(day.label.clone(), role_blocks);
        diagnostics.insert(day.label.clone(), day_diagnostics(problem, d, &unmet));
        if !unmet.is_empty() {
            unmet_demand.insert(day.label.clone(), unmet);
        }
    }

    let mut attendance = BTreeMap::new();
    for (w, worker) in problem.workers.iter().enumerate() {
        let mut by_day = BTreeMap::new();
        for (d, day) in horizon.days().iter().enumerate() {
            let on: Vec<bool> = decoded.assignments[w][d].iter().map(Option::is_some).collect();
            let intervals: Vec<Interval> = runs_of(&on)
                .into_iter()
                .filter(|(_, working)| **working)
                .map(|(slots, _)| {
                    let (start, end) = span(day, &slots);
                    Interval { start, end }
                })
                .collect();
            if !intervals.is_empty() {
                by_day.insert(day.label.clone(), intervals);
            }
        }
        attendance.insert(worker.name.clone(), by_day);
    }

    SolvedSchedule {
        schedule,
        by_role_assignments,
        attendance,
        unmet_demand,
        diagnostics,
        fairness_summary: fairness_summary(problem, decoded),
    }
}

fn fairness_summary(problem: &Problem, decoded: &Decoded) -> FairnessSummary {
    let horizon = &problem.horizon;
    let hours_by_worker: BTreeMap<String, f64> = problem
        .workers
        .iter()
        .zip(&decoded.hours)
        .map(|(worker, &slots)| (worker.name.clone(), horizon.slots_to_hours(slots)))
        .collect();

    let (prior_hours, cumulative_hours) = match problem.mode {
        PlanningMode::Weekly => (None, None),
        PlanningMode::SingleDay => {
            // Prior work as the model counts it, floored to whole slots.
            let prior: BTreeMap<String, f64> = problem
                .workers
                .iter()
                .map(|w| (w.name.clone(), horizon.slots_to_hours(w.prior_slots)))
                .collect();
            let cumulative = prior
                .iter()
                .map(|(name, before)| (name.clone(), before + hours_by_worker[name]))
                .collect();
            (Some(prior), Some(cumulative))
        }
    };

    FairnessSummary {
        min_hours: horizon.slots_to_hours(decoded.min_basis),
        max_hours: horizon.slots_to_hours(decoded.max_basis),
        workers_used: decoded.hours.iter().filter(|&&h| h > 0).count(),
        hours_by_worker,
        total_unmet: decoded.total_unmet(),
        prior_hours,
        cumulative_hours,
    }
}
