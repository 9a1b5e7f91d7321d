//! Staff Scheduling
//!
//! This library turns per-day role demand and worker availability into a
//! slot-based constraint model, solves it under a time budget, and decodes
//! the result into shift blocks, attendance, backups, unmet demand, and a
//! fairness summary.
//!
//! Weekly and single-day planning share one pipeline; see [`solver`].

pub mod availability;
pub mod backend;
pub mod backups;
#[cfg(feature = "console")]
pub mod console;
pub mod coverage;
pub mod decoder;
pub mod demo_data;
pub mod diagnostics;
pub mod domain;
pub mod dto;
pub mod encoder;
pub mod error;
pub mod horizon;
pub mod model;
pub mod problem;
pub mod solver;
pub mod time;

pub use dto::{ScheduleResult, ScheduleStatus};
pub use error::{ScheduleError, TimeError};
pub use solver::{solve, solve_async, solve_day, solve_week, SolveRequest, SolverConfig};
