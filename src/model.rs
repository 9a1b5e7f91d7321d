//! A small, solver-agnostic integer linear model.
//!
//! The encoder writes into a [`LinearModel`]; a
//! [`ConstraintBackend`](crate::backend::ConstraintBackend) translates it to
//! whatever engine it drives. The model can also evaluate a candidate
//! assignment on its own, which is how solutions are checked and ranked.
//!
//! Objectives are lexicographic: each call to [`LinearModel::minimize`] adds
//! a level that only breaks ties left by the levels before it.

use std::collections::BTreeMap;
use std::fmt;

/// Handle to a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Inclusive integer bounds of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Eq,
    Ge,
}

impl Relation {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Relation::Le => lhs <= rhs,
            Relation::Eq => lhs == rhs,
            Relation::Ge => lhs >= rhs,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Le => "<=",
            Relation::Eq => "==",
            Relation::Ge => ">=",
        })
    }
}

/// `coef * var`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub coef: i64,
    pub var: VarId,
}

impl Term {
    pub fn new(coef: i64, var: VarId) -> Self {
        Self { coef, var }
    }
}

/// `Σ terms (relation) rhs`, tagged with the family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub family: &'static str,
    pub terms: Vec<Term>,
    pub relation: Relation,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn lhs(&self, values: &Solution) -> i64 {
        evaluate(&self.terms, values)
    }
}

/// `Σ coef * value` over `terms`.
pub fn evaluate(terms: &[Term], values: &Solution) -> i64 {
    terms.iter().map(|t| t.coef * values.value(t.var)).sum()
}

/// Values for every variable of a model, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    values: Vec<i64>,
}

impl Solution {
    pub fn new(values: Vec<i64>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: VarId) -> i64 {
        self.values[var.0]
    }

    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) > 0
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A broken bound or constraint found by [`LinearModel::violations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Bound { var: VarId, value: i64, bounds: Bounds },
    Constraint { index: usize, family: &'static str, lhs: i64, relation: Relation, rhs: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    variables: Vec<Bounds>,
    constraints: Vec<LinearConstraint>,
    objectives: Vec<Vec<Term>>,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, lower: i64, upper: i64) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(Bounds { lower, upper });
        id
    }

    pub fn new_bool(&mut self) -> VarId {
        self.new_var(0, 1)
    }

    /// A variable whose domain is the single value `value`.
    pub fn fixed(&mut self, value: i64) -> VarId {
        self.new_var(value, value)
    }

    pub fn add(&mut self, family: &'static str, terms: Vec<Term>, relation: Relation, rhs: i64) {
        self.constraints.push(LinearConstraint {
            family,
            terms,
            relation,
            rhs,
        });
    }

    pub fn add_le(&mut self, family: &'static str, terms: Vec<Term>, rhs: i64) {
        self.add(family, terms, Relation::Le, rhs);
    }

    pub fn add_eq(&mut self, family: &'static str, terms: Vec<Term>, rhs: i64) {
        self.add(family, terms, Relation::Eq, rhs);
    }

    pub fn add_ge(&mut self, family: &'static str, terms: Vec<Term>, rhs: i64) {
        self.add(family, terms, Relation::Ge, rhs);
    }

    /// Adds the next objective level to minimize.
    pub fn minimize(&mut self, terms: Vec<Term>) {
        self.objectives.push(terms);
    }

    pub fn bounds(&self, var: VarId) -> Bounds {
        self.variables[var.0]
    }

    pub fn variables(&self) -> &[Bounds] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective levels, most significant first.
    pub fn objectives(&self) -> &[Vec<Term>] {
        &self.objectives
    }

    pub fn var_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Constraint counts per family, for reporting.
    pub fn family_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.constraints {
            *counts.entry(c.family).or_insert(0) += 1;
        }
        counts
    }

    /// Smallest and largest value `terms` can take within variable bounds.
    pub fn expression_range(&self, terms: &[Term]) -> (i64, i64) {
        terms.iter().fold((0i64, 0i64), |(lo, hi), t| {
            let b = self.bounds(t.var);
            let (a, z) = (t.coef * b.lower, t.coef * b.upper);
            (lo + a.min(z), hi + a.max(z))
        })
    }

    /// Value of every objective level; compares lexicographically.
    pub fn objective_value(&self, values: &Solution) -> Vec<i64> {
        self.objectives
            .iter()
            .map(|terms| evaluate(terms, values))
            .collect()
    }

    /// Every bound and constraint that `values` breaks.
    pub fn violations(&self, values: &Solution) -> Vec<Violation> {
        let mut found = Vec::new();
        for (i, bounds) in self.variables.iter().enumerate() {
            let value = values.values[i];
            if value < bounds.lower || value > bounds.upper {
                found.push(Violation::Bound {
                    var: VarId(i),
                    value,
                    bounds: *bounds,
                });
            }
        }
        for (index, c) in self.constraints.iter().enumerate() {
            let lhs = c.lhs(values);
            if !c.relation.holds(lhs, c.rhs) {
                found.push(Violation::Constraint {
                    index,
                    family: c.family,
                    lhs,
                    relation: c.relation,
                    rhs: c.rhs,
                });
            }
        }
        found
    }
}
