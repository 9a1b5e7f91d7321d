//! Benchmark for model encoding and solving.
//!
//! Run with: cargo run --release --bin bench

use std::time::{Duration, Instant};

use staff_scheduling::backend::{ConstraintBackend, PumpkinBackend, SearchBudget};
use staff_scheduling::decoder::{build_schedule, decode};
use staff_scheduling::demo_data::{self, DemoData};
use staff_scheduling::encoder::{encode, BreakRule};
use staff_scheduling::problem::{Assembly, Problem};
use staff_scheduling::solver::DEFAULT_SLOT_MINUTES;

fn main() -> anyhow::Result<()> {
    let input = demo_data::generate(DemoData::Large);

    println!("Benchmark: Encode, Solve, Decode");
    println!("  Days: {}", input.days.len());
    println!("  Workers: {}", input.workers.len());
    println!();

    let assemble_start = Instant::now();
    let problem = match Problem::weekly(&input, DEFAULT_SLOT_MINUTES)? {
        Assembly::Ready(problem) => problem,
        other => anyhow::bail!("demo data did not assemble: {:?}", other),
    };
    println!("Assembled {} slots ({:?})", problem.horizon.total_slots(), assemble_start.elapsed());

    let encode_start = Instant::now();
    let encoding = encode(&problem, BreakRule::default())?;
    let encode_time = encode_start.elapsed();

    #[cfg(feature = "console")]
    staff_scheduling::console::print_model(
        encoding.model.var_count(),
        encoding.model.constraint_count(),
        problem.horizon.total_slots(),
    );

    println!("Encoded model ({:?})", encode_time);
    println!("  Variables: {}", encoding.model.var_count());
    println!("  Constraints: {}", encoding.model.constraint_count());
    for (family, count) in encoding.model.family_counts() {
        println!("    {:<14} {}", family, count);
    }
    println!();

    let budget = SearchBudget {
        time_limit: Duration::from_secs(30),
        workers: 2,
    };
    let outcome = PumpkinBackend.solve(&encoding.model, &budget)?;

    println!("Results:");
    println!("  Status: {:?}", outcome.status);
    println!("  Objective: {:?}", outcome.objective);
    println!("  Time: {:.2?}", outcome.elapsed);

    if let Some(values) = &outcome.solution {
        let decode_start = Instant::now();
        let decoded = decode(&problem, &encoding, values);
        let schedule = build_schedule(&problem, &decoded, 5);
        println!("  Decode: {:.2?}", decode_start.elapsed());
        println!("  Unmet slots: {}", schedule.fairness_summary.total_unmet);

        // Solved values must satisfy every posted constraint
        let violations = encoding.model.violations(values);
        assert!(violations.is_empty(), "Solution violates the model: {:?}", violations);
        println!("  Constraints: verified");
    }
    Ok(())
}
