//! Solver configuration and the scheduling pipeline.
//!
//! Both planning modes run the same stages: assemble a [`Problem`], encode
//! it, solve under the time budget, then decode. Only assembly differs.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::backend::{ConstraintBackend, PumpkinBackend, SearchBudget, SolveStatus};
use crate::decoder::{build_schedule, decode};
use crate::domain::{ScheduleInput, SingleDayRequest};
use crate::dto::{ScheduleResult, ScheduleStatus};
use crate::encoder::{encode, BreakRule};
use crate::error::ScheduleError;
use crate::problem::{Assembly, Problem};
use crate::time::MINUTES_PER_DAY;

/// Default solving time: 10 seconds.
const DEFAULT_TIME_LIMIT_SECS: u64 = 10;

/// Default number of parallel search threads.
const DEFAULT_SEARCH_WORKERS: usize = 2;

/// Default slot length in minutes.
pub const DEFAULT_SLOT_MINUTES: u32 = 60;

/// Default number of backups listed per block.
const DEFAULT_MAX_BACKUPS: usize = 5;

/// Solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget for the search.
    pub time_limit: Duration,
    /// Parallel search threads.
    pub search_workers: usize,
    pub slot_minutes: u32,
    pub break_rule: BreakRule,
    /// Backups listed per block.
    pub max_backups: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(DEFAULT_TIME_LIMIT_SECS),
            search_workers: DEFAULT_SEARCH_WORKERS,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            break_rule: BreakRule::default(),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

impl SolverConfig {
    /// Creates a config with the default 10-second time limit.
    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_search_workers(mut self, workers: usize) -> Self {
        self.search_workers = workers;
        self
    }

    pub fn with_slot_minutes(mut self, minutes: u32) -> Self {
        self.slot_minutes = minutes;
        self
    }

    pub fn with_break_rule(mut self, rule: BreakRule) -> Self {
        self.break_rule = rule;
        self
    }

    pub fn with_max_backups(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        let problem = if self.slot_minutes == 0 || self.slot_minutes > MINUTES_PER_DAY {
            Some(format!("slot length must be 1-{} minutes", MINUTES_PER_DAY))
        } else if self.search_workers == 0 {
            Some("at least one search worker is required".to_string())
        } else if self.time_limit.is_zero() {
            Some("time limit must be positive".to_string())
        } else if self.break_rule.window == 0 {
            Some("break window must be at least one slot".to_string())
        } else {
            None
        };
        match problem {
            Some(reason) => Err(ScheduleError::InvalidConfig(reason)),
            None => Ok(()),
        }
    }

    pub fn search_budget(&self) -> SearchBudget {
        SearchBudget {
            time_limit: self.time_limit,
            workers: self.search_workers,
        }
    }
}

/// A request in either planning mode.
#[derive(Debug, Clone)]
pub enum SolveRequest {
    Weekly(ScheduleInput),
    SingleDay(SingleDayRequest),
}

/// Schedules a multi-day request.
pub fn solve_week(input: &ScheduleInput, config: &SolverConfig) -> Result<ScheduleResult, ScheduleError> {
    config.validate()?;
    run(&PumpkinBackend, Problem::weekly(input, config.slot_minutes)?, config)
}

/// Schedules a single day, counting prior hours toward caps and fairness.
pub fn solve_day(request: &SingleDayRequest, config: &SolverConfig) -> Result<ScheduleResult, ScheduleError> {
    config.validate()?;
    run(&PumpkinBackend, Problem::single_day(request, config.slot_minutes)?, config)
}

pub fn solve(request: &SolveRequest, config: &SolverConfig) -> Result<ScheduleResult, ScheduleError> {
    solve_with(&PumpkinBackend, request, config)
}

/// Runs the blocking pipeline on tokio's blocking pool.
pub async fn solve_async(request: SolveRequest, config: SolverConfig) -> Result<ScheduleResult, ScheduleError> {
    tokio::task::spawn_blocking(move || solve(&request, &config))
        .await
        .map_err(|e| ScheduleError::Interrupted(e.to_string()))?
}

/// Runs the pipeline against any backend.
pub fn solve_with<B: ConstraintBackend>(
    backend: &B,
    request: &SolveRequest,
    config: &SolverConfig,
) -> Result<ScheduleResult, ScheduleError> {
    config.validate()?;
    let assembly = match request {
        SolveRequest::Weekly(input) => Problem::weekly(input, config.slot_minutes)?,
        SolveRequest::SingleDay(day) => Problem::single_day(day, config.slot_minutes)?,
    };
    run(backend, assembly, config)
}

fn run<B: ConstraintBackend>(
    backend: &B,
    assembly: Assembly,
    config: &SolverConfig,
) -> Result<ScheduleResult, ScheduleError> {
    let started = Instant::now();
    let problem = match assembly {
        Assembly::Ready(problem) => problem,
        Assembly::NoDays => {
            info!("No days to schedule");
            return Ok(ScheduleResult::bare(ScheduleStatus::NoDays));
        }
        Assembly::NoWorkers => {
            info!("No workers to schedule");
            return Ok(ScheduleResult::bare(ScheduleStatus::NoEmployees));
        }
    };

    info!(
        mode = ?problem.mode,
        days = problem.day_count(),
        workers = problem.worker_count(),
        roles = problem.role_count(),
        slots = problem.horizon.total_slots(),
        "Problem assembled"
    );

    let encoding = encode(&problem, config.break_rule)?;
    info!(
        variables = encoding.model.var_count(),
        constraints = encoding.model.constraint_count(),
        "Model encoded"
    );
    debug!(weights = ?encoding.weights, families = ?encoding.model.family_counts(), "Model detail");

    let outcome = backend.solve(&encoding.model, &config.search_budget())?;
    let status = match outcome.status {
        SolveStatus::Optimal => ScheduleStatus::Optimal,
        SolveStatus::Feasible => ScheduleStatus::Feasible,
        SolveStatus::Infeasible => ScheduleStatus::Infeasible,
    };

    info!(
        status = status.as_str(),
        objective = ?outcome.objective,
        solve_secs = outcome.elapsed.as_secs_f64(),
        total_secs = started.elapsed().as_secs_f64(),
        "Solving complete"
    );

    match outcome.solution {
        Some(values) if status.has_schedule() => {
            let decoded = decode(&problem, &encoding, &values);
            let schedule = build_schedule(&problem, &decoded, config.max_backups);
            Ok(ScheduleResult::solved(status, schedule))
        }
        _ => Ok(ScheduleResult::bare(status)),
    }
}
