//! Validated, slot-level view of a scheduling request.
//!
//! Everything downstream of this module works on indices: days and slots
//! from the [`Horizon`], roles from its [`RoleIndex`](crate::horizon::RoleIndex),
//! and workers by position in [`Problem::workers`].

use std::collections::HashSet;

use crate::availability::encode_availability;
use crate::coverage::build_day_coverage;
use crate::domain::{
    normalize_day_label, normalize_days, order_day_labels, DayConfig, ScheduleInput,
    SingleDayRequest, Worker, WorkerId,
};
use crate::error::ScheduleError;
use crate::horizon::{Horizon, RoleIndex};
use crate::time::TimeRange;

/// Which hour totals bound capacity and drive fairness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanningMode {
    /// Several days; capacity is the weekly cap, fairness uses horizon hours.
    Weekly,
    /// One day; capacity is cap minus prior hours, fairness uses cumulative hours.
    SingleDay,
}

/// A worker reduced to per-slot facts.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerProfile {
    pub id: Option<WorkerId>,
    pub name: String,
    /// Indexed by role.
    pub qualified: Vec<bool>,
    /// Indexed by `[day][slot]`.
    pub availability: Vec<Vec<bool>>,
    /// Most slots this worker may be assigned over the horizon.
    pub capacity_slots: u32,
    /// Slots already worked before the horizon (single-day mode only).
    pub prior_slots: u32,
    pub max_hours: f64,
    pub prior_hours: f64,
}

impl WorkerProfile {
    pub fn is_available(&self, day: usize, slot: usize) -> bool {
        self.availability[day][slot]
    }

    pub fn can_work(&self, day: usize, slot: usize, role: usize) -> bool {
        self.qualified[role] && self.availability[day][slot]
    }
}

/// Everything the encoder, decoder, and diagnostics need.
#[derive(Debug, Clone)]
pub struct Problem {
    pub mode: PlanningMode,
    pub horizon: Horizon,
    /// Indexed by `[day][slot][role]`.
    pub coverage: Vec<Vec<Vec<u32>>>,
    pub workers: Vec<WorkerProfile>,
}

/// Outcome of assembling a request.
#[derive(Debug)]
pub enum Assembly {
    Ready(Problem),
    /// The request names no days.
    NoDays,
    /// The request names no workers.
    NoWorkers,
}

impl Problem {
    /// Assembles a multi-day request.
    pub fn weekly(input: &ScheduleInput, slot_minutes: u32) -> Result<Assembly, ScheduleError> {
        if input.days.is_empty() {
            return Ok(Assembly::NoDays);
        }
        let days = normalize_days(input.days.clone())?;
        let labels = order_day_labels(days.keys());

        let mut configs = Vec::with_capacity(labels.len());
        let mut windows = Vec::with_capacity(labels.len());
        for label in &labels {
            let config = &days[label];
            windows.push((label.clone(), day_window(label, config)?));
            configs.push(config);
        }

        let roles = RoleIndex::from_days(configs.iter().copied());
        let horizon = Horizon::weekly(windows, roles, slot_minutes);
        Self::assemble(PlanningMode::Weekly, horizon, &configs, &input.workers)
    }

    /// Assembles a single-day request.
    pub fn single_day(request: &SingleDayRequest, slot_minutes: u32) -> Result<Assembly, ScheduleError> {
        let label = normalize_day_label(&request.day_label);
        let window = day_window(&label, &request.day)?;
        let roles = RoleIndex::from_days([&request.day]);
        let horizon = Horizon::single_day(label, window, roles, slot_minutes);
        Self::assemble(PlanningMode::SingleDay, horizon, &[&request.day], &request.workers)
    }

    fn assemble(
        mode: PlanningMode,
        horizon: Horizon,
        configs: &[&DayConfig],
        workers: &[Worker],
    ) -> Result<Assembly, ScheduleError> {
        let coverage = horizon
            .days()
            .iter()
            .zip(configs)
            .map(|(day, config)| build_day_coverage(config, &horizon, day))
            .collect::<Result<Vec<_>, _>>()?;

        if workers.is_empty() {
            return Ok(Assembly::NoWorkers);
        }

        let mut seen = HashSet::new();
        let mut profiles = Vec::with_capacity(workers.len());
        for (position, worker) in workers.iter().enumerate() {
            if worker.name.trim().is_empty() {
                return Err(ScheduleError::UnnamedWorker(position));
            }
            if !seen.insert(worker.name.as_str()) {
                return Err(ScheduleError::DuplicateWorker(worker.name.clone()));
            }
            profiles.push(profile(mode, &horizon, worker)?);
        }

        Ok(Assembly::Ready(Problem {
            mode,
            horizon,
            coverage,
            workers: profiles,
        }))
    }

    pub fn day_count(&self) -> usize {
        self.horizon.days().len()
    }

    pub fn role_count(&self) -> usize {
        self.horizon.roles().len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn demand(&self, day: usize, slot: usize, role: usize) -> u32 {
        self.coverage[day][slot][role]
    }

    /// Largest value a worker's fairness basis can take.
    pub fn basis_upper_bound(&self) -> Result<u32, ScheduleError> {
        let total = u32::try_from(self.horizon.total_slots()).unwrap_or(u32::MAX);
        let mut bound = 0;
        for w in &self.workers {
            let basis = w
                .capacity_slots
                .min(total)
                .checked_add(w.prior_slots)
                .ok_or_else(|| {
                    ScheduleError::ModelOverflow(format!(
                        "worker `{}`: {} prior hours do not fit the slot grid",
                        w.name, w.prior_hours
                    ))
                })?;
            bound = bound.max(basis);
        }
        Ok(bound)
    }
}

fn day_window(label: &str, config: &DayConfig) -> Result<TimeRange, ScheduleError> {
    TimeRange::from_bounds(&config.open, &config.close)
        .and_then(TimeRange::ensure_ordered)
        .map_err(|source| ScheduleError::DayWindow {
            day: label.to_string(),
            source,
        })
}

fn profile(mode: PlanningMode, horizon: &Horizon, worker: &Worker) -> Result<WorkerProfile, ScheduleError> {
    if !(worker.max_hours >= 0.0) {
        return Err(ScheduleError::NegativeCapacity {
            worker: worker.name.clone(),
            hours: worker.max_hours,
        });
    }

    let roles = horizon.roles();
    let qualified = if worker.roles.is_empty() {
        vec![true; roles.len()]
    } else {
        let allowed: HashSet<&str> = worker.roles.iter().map(String::as_str).collect();
        roles.names().iter().map(|r| allowed.contains(r.as_str())).collect()
    };

    let merge_when_missing = mode == PlanningMode::SingleDay;
    let mut availability = Vec::with_capacity(horizon.days().len());
    for day in horizon.days() {
        let ranges = worker
            .availability
            .windows_for(&day.label, merge_when_missing)
            .into_iter()
            .map(|w| w.parse().and_then(TimeRange::ensure_ordered))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ScheduleError::Availability {
                worker: worker.name.clone(),
                day: day.label.clone(),
                source,
            })?;
        availability.push(encode_availability(&ranges, horizon, day));
    }

    let (prior_hours, capacity_hours) = match mode {
        PlanningMode::Weekly => (0.0, worker.max_hours),
        PlanningMode::SingleDay => {
            let prior = worker.prior_hours.max(0.0);
            (prior, (worker.max_hours - prior).max(0.0))
        }
    };

    Ok(WorkerProfile {
        id: worker.id.clone(),
        name: worker.name.clone(),
        qualified,
        availability,
        capacity_slots: horizon.hours_to_slots(capacity_hours),
        prior_slots: horizon.hours_to_slots(prior_hours),
        max_hours: worker.max_hours,
        prior_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DayConfig;

    fn ready(assembly: Assembly) -> Problem {
        match assembly {
            Assembly::Ready(problem) => problem,
            other => panic!("expected a problem, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_requests_short_circuit() {
        let empty = ScheduleInput::default();
        assert!(matches!(Problem::weekly(&empty, 60).unwrap(), Assembly::NoDays));

        let no_workers = ScheduleInput::new(vec![])
            .with_day("monday", DayConfig::new("09:00", "17:00").with_role("cashier", 1));
        assert!(matches!(Problem::weekly(&no_workers, 60).unwrap(), Assembly::NoWorkers));

        let request = SingleDayRequest::new(
            "day",
            DayConfig::new("09:00", "17:00").with_role("cashier", 1),
            vec![],
        );
        assert!(matches!(Problem::single_day(&request, 60).unwrap(), Assembly::NoWorkers));
    }

    #[test]
    fn test_weekly_problem_orders_days_and_encodes_workers() {
        let input = ScheduleInput::new(vec![
            Worker::new("Asha")
                .with_roles(["cashier"])
                .with_max_hours(20.0)
                .with_prior_hours(6.0)
                .available("tue", &["10:00-12:00"]),
            Worker::new("Bharat").available("monday", &["09:00-17:00"]),
        ])
        .with_day("Tuesday", DayConfig::new("10:00", "14:00").with_role("cashier", 1))
        .with_day(
            "mon",
            DayConfig::new("09:00", "17:00")
                .with_role("cashier", 1)
                .with_peak("12:00", "13:00", [("helper", 1)]),
        );

        let problem = ready(Problem::weekly(&input, 60).unwrap());
        let labels: Vec<&str> = problem.horizon.days().iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["monday", "tuesday"]);
        assert_eq!(problem.horizon.roles().names(), &["cashier", "helper"]);
        assert_eq!(problem.coverage[0].len(), 8);
        assert_eq!(problem.coverage[1].len(), 4);

        let asha = &problem.workers[0];
        assert_eq!(asha.qualified, vec![true, false]);
        assert_eq!(asha.capacity_slots, 20);
        assert_eq!(asha.prior_slots, 0, "prior hours only count in single-day mode");
        assert!(asha.availability[0].iter().all(|s| !s));
        assert_eq!(asha.availability[1], vec![true, true, false, false]);

        let bharat = &problem.workers[1];
        assert_eq!(bharat.qualified, vec![true, true]);
        assert_eq!(bharat.capacity_slots, 40);
        assert!(bharat.availability[0].iter().all(|s| *s));
    }

    #[test]
    fn test_single_day_capacity_subtracts_prior_hours() {
        let request = SingleDayRequest::new(
            "friday",
            DayConfig::new("09:00", "22:00").with_role("cashier", 1),
            vec![
                Worker::new("Asha").with_max_hours(20.0).with_prior_hours(4.0),
                Worker::new("Jay").with_max_hours(10.0).with_prior_hours(12.0),
            ],
        );
        let problem = ready(Problem::single_day(&request, 60).unwrap());
        assert_eq!(problem.mode, PlanningMode::SingleDay);
        assert_eq!(problem.workers[0].capacity_slots, 16);
        assert_eq!(problem.workers[0].prior_slots, 4);
        assert_eq!(problem.workers[1].capacity_slots, 0);
        assert_eq!(problem.basis_upper_bound().unwrap(), 13 + 4);
    }

    #[test]
    fn test_huge_prior_hours_overflow_cleanly() {
        let request = SingleDayRequest::new(
            "friday",
            DayConfig::new("09:00", "22:00").with_role("cashier", 1),
            vec![Worker::new("Asha").with_max_hours(1e10).with_prior_hours(5e9)],
        );
        let problem = ready(Problem::single_day(&request, 60).unwrap());
        assert!(matches!(
            problem.basis_upper_bound(),
            Err(ScheduleError::ModelOverflow(_))
        ));
    }

    #[test]
    fn test_input_errors_abort_assembly() {
        let bad_hours = ScheduleInput::new(vec![Worker::new("Asha")])
            .with_day("monday", DayConfig::new("25:00", "26:00").with_role("cashier", 1));
        assert!(matches!(
            Problem::weekly(&bad_hours, 60),
            Err(ScheduleError::DayWindow { .. })
        ));

        let inverted = ScheduleInput::new(vec![Worker::new("Asha").available("monday", &["17:00-09:00"])])
            .with_day("monday", DayConfig::new("09:00", "17:00").with_role("cashier", 1));
        assert!(matches!(
            Problem::weekly(&inverted, 60),
            Err(ScheduleError::Availability { .. })
        ));

        let duplicate = ScheduleInput::new(vec![Worker::new("Asha"), Worker::new("Asha")])
            .with_day("monday", DayConfig::new("09:00", "17:00").with_role("cashier", 1));
        assert!(matches!(
            Problem::weekly(&duplicate, 60),
            Err(ScheduleError::DuplicateWorker(name)) if name == "Asha"
        ));

        let negative = ScheduleInput::new(vec![Worker::new("Asha").with_max_hours(-1.0)])
            .with_day("monday", DayConfig::new("09:00", "17:00").with_role("cashier", 1));
        assert!(matches!(
            Problem::weekly(&negative, 60),
            Err(ScheduleError::NegativeCapacity { .. })
        ));
    }

    #[test]
    fn test_single_day_availability_falls_back_to_all_entries() {
        let request = SingleDayRequest::new(
            "day",
            DayConfig::new("09:00", "13:00").with_role("cashier", 1),
            vec![Worker::new("Chitra")
                .available("monday", &["09:00-10:00"])
                .available("tuesday", &["12:00-13:00"])],
        );
        let problem = ready(Problem::single_day(&request, 60).unwrap());
        assert_eq!(problem.workers[0].availability[0], vec![true, false, false, true]);
    }
}
