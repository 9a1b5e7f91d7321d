//! Encodes a [`Problem`] as a [`LinearModel`].
//!
//! Variables, per run:
//!
//! * `x[w][d][s][r]`: worker `w` covers role `r` in slot `s` of day `d`.
//!   Created for every combination; ones the worker cannot take (not
//!   qualified or unavailable) are fixed to zero.
//! * `slack[d][s][r]`: unmet demand, bounded by that slot's demand.
//! * `hours[w]`: slots worked, bounded by the worker's capacity.
//! * `worked[w]`: whether `w` works at all.
//! * `min_basis` / `max_basis`: bounds on every worker's fairness basis.
//!
//! The objective has two levels. The first minimizes total unmet demand.
//! The second is tiered through its weights: the lowest basis (raised),
//! then workers used (raised), then the highest basis (lowered).

use crate::error::ScheduleError;
use crate::model::{LinearModel, Solution, Term, VarId};
use crate::problem::Problem;

/// At most `max_worked` worked slots in any `window` consecutive slots of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRule {
    pub window: usize,
    pub max_worked: usize,
}

impl Default for BreakRule {
    fn default() -> Self {
        Self {
            window: 7,
            max_worked: 6,
        }
    }
}

/// Objective coefficients for one problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveWeights {
    pub min_basis: i64,
    pub used: i64,
    pub range: i64,
}

impl ObjectiveWeights {
    /// Derives weights so each fairness tier dominates every tier below it.
    ///
    /// With `H` the largest fairness basis and `E` the worker count: the
    /// range weight is 1, `used = H + 1` and `min_basis = used * (E + 1)`.
    /// Unmet demand sits on its own objective level and needs no weight.
    pub fn for_problem(problem: &Problem) -> Result<Self, ScheduleError> {
        let h = i64::from(problem.basis_upper_bound()?);
        let e = problem.worker_count() as i64;

        let overflow = || {
            ScheduleError::ModelOverflow(format!(
                "objective weights for {} workers and basis bound {}",
                e, h
            ))
        };
        let used = h + 1;
        let min_basis = used.checked_mul(e + 1).ok_or_else(overflow)?;
        let span = min_basis.checked_mul(h + 1).ok_or_else(overflow)?;
        if span > i64::from(i32::MAX) {
            return Err(overflow());
        }

        Ok(Self {
            min_basis,
            used,
            range: 1,
        })
    }
}

/// The encoded model plus the handles needed to read a solution back.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub model: LinearModel,
    pub weights: ObjectiveWeights,
    assign: Vec<Vec<Vec<Vec<VarId>>>>,
    slack: Vec<Vec<Vec<VarId>>>,
    pub hours: Vec<VarId>,
    pub worked: Vec<VarId>,
    pub min_basis: VarId,
    pub max_basis: VarId,
}

impl Encoding {
    pub fn assignment(&self, worker: usize, day: usize, slot: usize, role: usize) -> VarId {
        self.assign[worker][day][slot][role]
    }

    pub fn slack(&self, day: usize, slot: usize, role: usize) -> VarId {
        self.slack[day][slot][role]
    }

    /// The role `worker` covers in the given slot, if any.
    pub fn assigned_role(&self, values: &Solution, worker: usize, day: usize, slot: usize) -> Option<usize> {
        self.assign[worker][day][slot]
            .iter()
            .position(|&var| values.is_set(var))
    }
}

pub fn encode(problem: &Problem, rule: BreakRule) -> Result<Encoding, ScheduleError> {
    if rule.window == 0 {
        return Err(ScheduleError::InvalidConfig(
            "break window must be at least one slot".to_string(),
        ));
    }
    let weights = ObjectiveWeights::for_problem(problem)?;
    let days = problem.horizon.days();
    let roles = problem.role_count();
    let mut model = LinearModel::new();

    let mut assign = Vec::with_capacity(problem.worker_count());
    for worker in &problem.workers {
        let mut by_day = Vec::with_capacity(days.len());
        for (d, day) in days.iter().enumerate() {
            let mut by_slot = Vec::with_capacity(day.slot_count);
            for s in day.slots() {
                let vars: Vec<VarId> = (0..roles)
                    .map(|r| {
                        if worker.can_work(d, s, r) {
                            model.new_bool()
                        } else {
                            model.fixed(0)
                        }
                    })
                    .collect();
                by_slot.push(vars);
            }
            by_day.push(by_slot);
        }
        assign.push(by_day);
    }

    let slack: Vec<Vec<Vec<VarId>>> = days
        .iter()
        .enumerate()
        .map(|(d, day)| {
            day.slots()
                .map(|s| {
                    (0..roles)
                        .map(|r| model.new_var(0, i64::from(problem.demand(d, s, r))))
                        .collect()
                })
                .collect()
        })
        .collect();

    // One role per worker and slot.
    for (w, worker) in problem.workers.iter().enumerate() {
        for (d, day) in days.iter().enumerate() {
            for s in day.slots() {
                let terms: Vec<Term> = (0..roles)
                    .filter(|&r| worker.can_work(d, s, r))
                    .map(|r| Term::new(1, assign[w][d][s][r]))
                    .collect();
                if terms.len() > 1 {
                    model.add_le("one_role", terms, 1);
                }
            }
        }
    }

    // Coverage: assigned + slack == demand.
    for (d, day) in days.iter().enumerate() {
        for s in day.slots() {
            for r in 0..roles {
                let demand = problem.demand(d, s, r);
                let mut terms: Vec<Term> = problem
                    .workers
                    .iter()
                    .enumerate()
                    .filter(|(_, worker)| worker.can_work(d, s, r))
                    .map(|(w, _)| Term::new(1, assign[w][d][s][r]))
                    .collect();
                if terms.is_empty() && demand == 0 {
                    continue;
                }
                terms.push(Term::new(1, slack[d][s][r]));
                model.add_eq("coverage", terms, i64::from(demand));
            }
        }
    }

    let mut hours = Vec::with_capacity(problem.worker_count());
    let mut worked = Vec::with_capacity(problem.worker_count());
    for (w, worker) in problem.workers.iter().enumerate() {
        let open: Vec<Term> = days
            .iter()
            .enumerate()
            .flat_map(|(d, day)| day.slots().map(move |s| (d, s)))
            .flat_map(|(d, s)| (0..roles).map(move |r| (d, s, r)))
            .filter(|&(d, s, r)| worker.can_work(d, s, r))
            .map(|(d, s, r)| Term::new(1, assign[w][d][s][r]))
            .collect();

        let reachable = days
            .iter()
            .enumerate()
            .map(|(d, day)| day.slots().filter(|&s| worker.is_available(d, s)).count())
            .sum::<usize>() as u32;
        let capacity = i64::from(worker.capacity_slots.min(reachable));

        let h = model.new_var(0, capacity);
        let mut total = open;
        total.push(Term::new(-1, h));
        model.add_eq("hours", total, 0);

        let used = model.new_bool();
        model.add_le("worked_lower", vec![Term::new(1, used), Term::new(-1, h)], 0);
        if capacity > 0 {
            model.add_le("worked_upper", vec![Term::new(1, h), Term::new(-capacity, used)], 0);
        } else {
            model.add_le("worked_upper", vec![Term::new(1, used)], 0);
        }

        hours.push(h);
        worked.push(used);
    }

    // Rest breaks, within each day.
    for (w, worker) in problem.workers.iter().enumerate() {
        for (d, day) in days.iter().enumerate() {
            if day.slot_count < rule.window {
                continue;
            }
            for start in 0..=day.slot_count - rule.window {
                let slots = start..start + rule.window;
                let available = slots.clone().filter(|&s| worker.is_available(d, s)).count();
                if available <= rule.max_worked {
                    continue;
                }
                let terms: Vec<Term> = slots
                    .flat_map(|s| (0..roles).map(move |r| (s, r)))
                    .filter(|&(s, r)| worker.can_work(d, s, r))
                    .map(|(s, r)| Term::new(1, assign[w][d][s][r]))
                    .collect();
                if terms.len() > rule.max_worked {
                    model.add_le("break", terms, rule.max_worked as i64);
                }
            }
        }
    }

    // Fairness band over each worker's basis (hours, plus prior work).
    let bound = i64::from(problem.basis_upper_bound()?);
    let min_basis = model.new_var(0, bound);
    let max_basis = model.new_var(0, bound);
    for (w, worker) in problem.workers.iter().enumerate() {
        let prior = i64::from(worker.prior_slots);
        model.add_ge(
            "fair_min",
            vec![Term::new(1, hours[w]), Term::new(-1, min_basis)],
            -prior,
        );
        model.add_le(
            "fair_max",
            vec![Term::new(1, hours[w]), Term::new(-1, max_basis)],
            -prior,
        );
    }

    model.minimize(
        slack
            .iter()
            .flatten()
            .flatten()
            .map(|&var| Term::new(1, var))
            .collect(),
    );

    let mut fairness = vec![Term::new(-weights.min_basis, min_basis)];
    fairness.extend(worked.iter().map(|&var| Term::new(-weights.used, var)));
    fairness.push(Term::new(weights.range, max_basis));
    model.minimize(fairness);

    Ok(Encoding {
        model,
        weights,
        assign,
        slack,
        hours,
        worked,
        min_basis,
        max_basis,
    })
}
