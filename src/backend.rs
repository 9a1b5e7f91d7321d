//! Constraint-optimization backends.
//!
//! [`PumpkinBackend`] hands a [`LinearModel`] to the Pumpkin lazy-clause
//! generation solver, one objective level at a time. Each level's best value
//! becomes a bound for the levels after it. Within a level, several search
//! threads run side by side with different optimisation procedures; whichever
//! proves optimality or infeasibility first stops the others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use pumpkin_solver::constraints as cp;
use pumpkin_solver::optimisation::linear_sat_unsat::LinearSatUnsat;
use pumpkin_solver::optimisation::linear_unsat_sat::LinearUnsatSat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::{OptimisationResult, ProblemSolution, SolutionReference};
use pumpkin_solver::termination::{TerminationCondition, TimeBudget};
use pumpkin_solver::variables::{DomainId, TransformableVariable};
use pumpkin_solver::Solver;
use tracing::debug;

use crate::error::ScheduleError;
use crate::model::{evaluate, LinearModel, Relation, Solution, Term};

/// Wall-clock limit and parallelism for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    pub time_limit: Duration,
    pub workers: usize,
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Best possible objective, proven.
    Optimal,
    /// A solution was found, but the budget ran out before a proof.
    Feasible,
    /// No solution exists, or none was found within the budget.
    Infeasible,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub solution: Option<Solution>,
    /// Value of every objective level, most significant first.
    pub objective: Option<Vec<i64>>,
    pub elapsed: Duration,
}

/// Anything that can minimize a [`LinearModel`] under a budget.
pub trait ConstraintBackend {
    fn solve(&self, model: &LinearModel, budget: &SearchBudget) -> Result<SolveOutcome, ScheduleError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PumpkinBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// Improve from the first solution found.
    SatUnsat,
    /// Raise a lower bound until a solution appears.
    UnsatSat,
}

impl Strategy {
    fn for_worker(index: usize) -> Self {
        if index % 2 == 0 {
            Strategy::SatUnsat
        } else {
            Strategy::UnsatSat
        }
    }
}

enum Attempt {
    Optimal(Solution),
    Satisfiable(Solution),
    Unsatisfiable,
    Unknown,
}

impl Attempt {
    fn label(&self) -> &'static str {
        match self {
            Attempt::Optimal(_) => "optimal",
            Attempt::Satisfiable(_) => "satisfiable",
            Attempt::Unsatisfiable => "unsatisfiable",
            Attempt::Unknown => "unknown",
        }
    }
}

/// Result of one objective level across the portfolio.
#[derive(Debug)]
struct LevelOutcome {
    status: SolveStatus,
    solution: Option<Solution>,
}

/// An earlier level's objective, held at or below its best value.
type LevelBound<'a> = (&'a [Term], i64);

/// Stops on the shared flag or on the worker's own time budget.
struct SharedStop<'a> {
    flag: &'a AtomicBool,
    budget: TimeBudget,
}

impl TerminationCondition for SharedStop<'_> {
    fn should_stop(&mut self) -> bool {
        self.flag.load(Ordering::Relaxed) || self.budget.should_stop()
    }
}

fn noop_callback<B>(_: &Solver, _: SolutionReference, _: &B) {}

impl ConstraintBackend for PumpkinBackend {
    fn solve(&self, model: &LinearModel, budget: &SearchBudget) -> Result<SolveOutcome, ScheduleError> {
        check_domains(model)?;

        let started = Instant::now();
        let deadline = started + budget.time_limit;
        let levels: Vec<&[Term]> = if model.objectives().is_empty() {
            vec![&[] as &[Term]]
        } else {
            model.objectives().iter().map(Vec::as_slice).collect()
        };

        let mut bounds: Vec<LevelBound> = Vec::with_capacity(levels.len());
        let mut best: Option<Solution> = None;
        let mut proven = true;

        for (level, &objective) in levels.iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() && best.is_some() {
                proven = false;
                break;
            }

            let attempts = run_portfolio(model, objective, &bounds, remaining, budget.workers)?;
            let outcome = merge_attempts(objective, attempts);
            debug!(level, status = ?outcome.status, "objective level finished");

            match (outcome.status, outcome.solution) {
                (SolveStatus::Infeasible, _) | (_, None) => {
                    if best.is_none() {
                        return Ok(SolveOutcome {
                            status: SolveStatus::Infeasible,
                            solution: None,
                            objective: None,
                            elapsed: started.elapsed(),
                        });
                    }
                    // Earlier levels already hold a solution.
                    proven = false;
                    break;
                }
                (status, Some(solution)) => {
                    proven &= status == SolveStatus::Optimal;
                    bounds.push((objective, evaluate(objective, &solution)));
                    best = Some(solution);
                }
            }
        }

        let status = if proven {
            SolveStatus::Optimal
        } else {
            SolveStatus::Feasible
        };
        Ok(SolveOutcome {
            status,
            objective: best.as_ref().map(|s| model.objective_value(s)),
            solution: best,
            elapsed: started.elapsed(),
        })
    }
}

/// Runs one objective level on `workers` threads and collects every result.
fn run_portfolio(
    model: &LinearModel,
    objective: &[Term],
    bounds: &[LevelBound],
    limit: Duration,
    workers: usize,
) -> Result<Vec<Attempt>, ScheduleError> {
    let stop = AtomicBool::new(false);
    let joined: Vec<thread::Result<Attempt>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers.max(1))
            .map(|index| {
                let stop = &stop;
                scope.spawn(move || {
                    let strategy = Strategy::for_worker(index);
                    let attempt = run_worker(model, objective, bounds, strategy, limit, stop);
                    debug!(worker = index, ?strategy, outcome = attempt.label(), "search worker finished");
                    attempt
                })
            })
            .collect();
        // Join all of them so a panic in one never escapes the scope.
        handles.into_iter().map(|handle| handle.join()).collect()
    });

    joined
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ScheduleError::Interrupted("search worker panicked".to_string()))
}

fn merge_attempts(objective: &[Term], attempts: Vec<Attempt>) -> LevelOutcome {
    let mut optimal = None;
    let mut best: Option<(i64, Solution)> = None;
    let mut infeasible = false;

    for attempt in attempts {
        match attempt {
            Attempt::Optimal(solution) => {
                if optimal.is_none() {
                    optimal = Some(solution);
                }
            }
            Attempt::Satisfiable(solution) => {
                let value = evaluate(objective, &solution);
                if best.as_ref().map_or(true, |(current, _)| value < *current) {
                    best = Some((value, solution));
                }
            }
            Attempt::Unsatisfiable => infeasible = true,
            Attempt::Unknown => {}
        }
    }

    let (status, solution) = match (optimal, best) {
        (Some(solution), _) => (SolveStatus::Optimal, Some(solution)),
        (None, _) if infeasible => (SolveStatus::Infeasible, None),
        (None, Some((_, solution))) => (SolveStatus::Feasible, Some(solution)),
        (None, None) => (SolveStatus::Infeasible, None),
    };
    LevelOutcome { status, solution }
}

fn run_worker(
    model: &LinearModel,
    objective_terms: &[Term],
    bounds: &[LevelBound],
    strategy: Strategy,
    limit: Duration,
    stop: &AtomicBool,
) -> Attempt {
    let mut solver = Solver::default();
    let vars: Vec<DomainId> = model
        .variables()
        .iter()
        .map(|b| solver.new_bounded_integer(b.lower as i32, b.upper as i32))
        .collect();
    let tag = solver.new_constraint_tag();

    // Zero coefficients have no effect and cannot be scaled.
    let scaled = |terms: &[Term]| -> Vec<_> {
        terms
            .iter()
            .filter(|t| t.coef != 0)
            .map(|t| vars[t.var.index()].scaled(t.coef as i32))
            .collect()
    };

    let mut post = |terms: &[Term], relation: Relation, rhs: i64| -> bool {
        let terms = scaled(terms);
        if terms.is_empty() {
            return relation.holds(0, rhs);
        }
        let rhs = rhs as i32;
        let posted = match relation {
            Relation::Le => solver
                .add_constraint(cp::less_than_or_equals(terms, rhs, tag))
                .post(),
            Relation::Eq => solver.add_constraint(cp::equals(terms, rhs, tag)).post(),
            Relation::Ge => solver
                .add_constraint(cp::greater_than_or_equals(terms, rhs, tag))
                .post(),
        };
        posted.is_ok()
    };

    // A failed post means the model is infeasible at the root.
    for c in model.constraints() {
        if !post(&c.terms, c.relation, c.rhs) {
            return Attempt::Unsatisfiable;
        }
    }
    for &(terms, value) in bounds {
        if !post(terms, Relation::Le, value) {
            return Attempt::Unsatisfiable;
        }
    }

    let (lowest, highest) = model.expression_range(objective_terms);
    let objective = solver.new_bounded_integer(lowest as i32, highest as i32);
    let mut definition = scaled(objective_terms);
    definition.push(objective.scaled(-1));
    if solver
        .add_constraint(cp::equals(definition, 0, tag))
        .post()
        .is_err()
    {
        return Attempt::Unsatisfiable;
    }

    let mut brancher = solver.default_brancher();
    let mut termination = SharedStop {
        flag: stop,
        budget: TimeBudget::starting_now(limit),
    };
    let direction = OptimisationDirection::Minimise;
    let result = match strategy {
        Strategy::SatUnsat => solver.optimise(
            &mut brancher,
            &mut termination,
            LinearSatUnsat::new(direction, objective, noop_callback),
        ),
        Strategy::UnsatSat => solver.optimise(
            &mut brancher,
            &mut termination,
            LinearUnsatSat::new(direction, objective, noop_callback),
        ),
    };

    match result {
        OptimisationResult::Optimal(solution) => {
            stop.store(true, Ordering::Relaxed);
            Attempt::Optimal(read_values(&solution, &vars))
        }
        OptimisationResult::Satisfiable(solution) => Attempt::Satisfiable(read_values(&solution, &vars)),
        OptimisationResult::Unsatisfiable => {
            stop.store(true, Ordering::Relaxed);
            Attempt::Unsatisfiable
        }
        OptimisationResult::Unknown => Attempt::Unknown,
    }
}

fn read_values<S: ProblemSolution>(solution: &S, vars: &[DomainId]) -> Solution {
    Solution::new(
        vars.iter()
            .map(|&var| i64::from(solution.get_integer_value(var)))
            .collect(),
    )
}

/// Rejects models whose bounds, coefficients, or partial sums leave `i32`.
pub fn check_domains(model: &LinearModel) -> Result<(), ScheduleError> {
    let fits = |v: i64| i32::try_from(v).is_ok();

    for (i, b) in model.variables().iter().enumerate() {
        if !fits(b.lower) || !fits(b.upper) {
            return Err(ScheduleError::ModelOverflow(format!(
                "variable {} has bounds [{}, {}]",
                i, b.lower, b.upper
            )));
        }
    }
    for (i, c) in model.constraints().iter().enumerate() {
        let (lo, hi) = model.expression_range(&c.terms);
        if !fits(c.rhs) || !fits(lo) || !fits(hi) || c.terms.iter().any(|t| !fits(t.coef)) {
            return Err(ScheduleError::ModelOverflow(format!(
                "{} constraint {} spans [{}, {}] against {}",
                c.family, i, lo, hi, c.rhs
            )));
        }
    }
    for (level, terms) in model.objectives().iter().enumerate() {
        let (lo, hi) = model.expression_range(terms);
        if !fits(lo) || !fits(hi) || terms.iter().any(|t| !fits(t.coef)) {
            return Err(ScheduleError::ModelOverflow(format!(
                "objective level {} spans [{}, {}]",
                level, lo, hi
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> SearchBudget {
        SearchBudget {
            time_limit: Duration::from_secs(5),
            workers: 2,
        }
    }

    #[test]
    fn test_minimizes_small_model() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 5);
        let y = model.new_var(0, 5);
        model.add_ge("sum", vec![Term::new(1, x), Term::new(1, y)], 3);
        model.add_le("cap", vec![Term::new(1, x)], 1);
        model.minimize(vec![Term::new(1, x), Term::new(2, y)]);

        let outcome = PumpkinBackend.solve(&model, &budget()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(vec![1 + 2 * 2]));
        let solution = outcome.solution.unwrap();
        assert!(model.violations(&solution).is_empty());
        assert_eq!((solution.value(x), solution.value(y)), (1, 2));
    }

    #[test]
    fn test_reports_infeasible_models() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 5);
        model.add_le("upper", vec![Term::new(1, x)], 1);
        model.add_ge("lower", vec![Term::new(1, x)], 2);
        model.minimize(vec![Term::new(1, x)]);

        let outcome = PumpkinBackend.solve(&model, &budget()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.solution.is_none());
    }

    #[test]
    fn test_single_worker_portfolio() {
        let mut model = LinearModel::new();
        let x = model.new_bool();
        model.minimize(vec![Term::new(-1, x)]);
        let single = SearchBudget {
            time_limit: Duration::from_secs(5),
            workers: 1,
        };
        let outcome = PumpkinBackend.solve(&model, &single).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(vec![-1]));
    }

    #[test]
    fn test_rejects_out_of_range_models() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, i64::from(i32::MAX) + 1);
        model.minimize(vec![Term::new(1, x)]);
        assert!(matches!(
            PumpkinBackend.solve(&model, &budget()),
            Err(ScheduleError::ModelOverflow(_))
        ));

        let mut model = LinearModel::new();
        let y = model.new_var(0, 1_000_000);
        model.minimize(vec![Term::new(1_000_000, y)]);
        assert!(matches!(
            PumpkinBackend.solve(&model, &budget()),
            Err(ScheduleError::ModelOverflow(_))
        ));
    }

    #[test]
    fn test_later_levels_keep_earlier_optimum() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 3);
        let y = model.new_var(0, 3);
        model.add_ge("sum", vec![Term::new(1, x), Term::new(1, y)], 3);
        model.minimize(vec![Term::new(1, x)]);
        // Cheaper in y alone, but x may not rise again.
        model.minimize(vec![Term::new(1, y)]);

        let outcome = PumpkinBackend.solve(&model, &budget()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(vec![0, 3]));
        let solution = outcome.solution.unwrap();
        assert_eq!((solution.value(x), solution.value(y)), (0, 3));
    }

    #[test]
    fn test_zero_coefficients_are_skipped() {
        let mut model = LinearModel::new();
        let x = model.new_bool();
        let y = model.new_bool();
        model.add_le("mixed", vec![Term::new(0, x), Term::new(1, y)], 0);
        model.add_le("empty", vec![Term::new(0, y)], 0);
        model.minimize(vec![Term::new(0, y), Term::new(-1, x)]);

        let outcome = PumpkinBackend.solve(&model, &budget()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(vec![-1]));

        let mut model = LinearModel::new();
        let x = model.new_bool();
        model.add_ge("never", vec![Term::new(0, x)], 1);
        model.minimize(vec![Term::new(1, x)]);
        let outcome = PumpkinBackend.solve(&model, &budget()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_satisfiable_attempts_merge_to_feasible() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 9);
        let objective = vec![Term::new(1, x)];

        let merged = merge_attempts(
            &objective,
            vec![
                Attempt::Unknown,
                Attempt::Satisfiable(Solution::new(vec![4])),
            ],
        );
        assert_eq!(merged.status, SolveStatus::Feasible);
        assert_eq!(merged.solution.unwrap().value(x), 4);
    }

    #[test]
    fn test_best_satisfiable_attempt_wins() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 9);
        let objective = vec![Term::new(1, x)];

        let merged = merge_attempts(
            &objective,
            vec![
                Attempt::Satisfiable(Solution::new(vec![7])),
                Attempt::Satisfiable(Solution::new(vec![2])),
                Attempt::Satisfiable(Solution::new(vec![5])),
            ],
        );
        assert_eq!(merged.status, SolveStatus::Feasible);
        assert_eq!(merged.solution.unwrap().value(x), 2);
    }

    #[test]
    fn test_optimal_attempt_beats_unsatisfiable() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 9);
        let objective = vec![Term::new(1, x)];

        let merged = merge_attempts(
            &objective,
            vec![
                Attempt::Unsatisfiable,
                Attempt::Optimal(Solution::new(vec![3])),
                Attempt::Satisfiable(Solution::new(vec![1])),
            ],
        );
        assert_eq!(merged.status, SolveStatus::Optimal);
        assert_eq!(merged.solution.unwrap().value(x), 3);
    }

    #[test]
    fn test_unknown_attempts_merge_to_infeasible() {
        let merged = merge_attempts(&[], vec![Attempt::Unknown, Attempt::Unknown]);
        assert_eq!(merged.status, SolveStatus::Infeasible);
        assert!(merged.solution.is_none());

        let merged = merge_attempts(&[], vec![Attempt::Unsatisfiable, Attempt::Unknown]);
        assert_eq!(merged.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_rejects_overflowing_later_level() {
        let mut model = LinearModel::new();
        let x = model.new_var(0, 10);
        model.minimize(vec![Term::new(1, x)]);
        model.minimize(vec![Term::new(i64::from(i32::MAX), x)]);
        assert!(matches!(
            check_domains(&model),
            Err(ScheduleError::ModelOverflow(_))
        ));
    }
}
