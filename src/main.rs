//! Staff Scheduling - command line runner
//!
//! Run with: cargo run -- --demo small
//! Or:       cargo run -- --input request.json --single-day --day-label fri

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use staff_scheduling::demo_data::{self, DemoData};
use staff_scheduling::domain::{ScheduleInput, SingleDayRequest};
use staff_scheduling::{solve_async, SolveRequest, SolverConfig};

#[derive(Parser)]
#[command(version, about = "Role-based shift staffing")]
struct Args {
    /// JSON request; a demo data set is used when absent.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Demo data set (SMALL or LARGE).
    #[arg(long, default_value = "SMALL")]
    demo: String,

    /// Plan a single day, counting prior hours.
    #[arg(long)]
    single_day: bool,

    /// Day to pick from a weekly payload in single-day mode.
    #[arg(long)]
    day_label: Option<String>,

    /// Search time limit in seconds.
    #[arg(long)]
    time_limit: Option<u64>,

    #[arg(long)]
    search_workers: Option<usize>,

    #[arg(long)]
    slot_minutes: Option<u32>,

    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> SolverConfig {
        let mut config = SolverConfig::default_config();
        if let Some(secs) = self.time_limit {
            config = config.with_time_limit(Duration::from_secs(secs));
        }
        if let Some(workers) = self.search_workers {
            config = config.with_search_workers(workers);
        }
        if let Some(minutes) = self.slot_minutes {
            config = config.with_slot_minutes(minutes);
        }
        config
    }

    fn request(&self) -> Result<SolveRequest> {
        let Some(path) = &self.input else {
            if self.single_day {
                return Ok(SolveRequest::SingleDay(demo_data::single_day()));
            }
            let demo: DemoData = self.demo.parse().map_err(|_| {
                anyhow::anyhow!(
                    "unknown demo `{}`, expected one of {:?}",
                    self.demo,
                    demo_data::list_demo_data()
                )
            })?;
            return Ok(SolveRequest::Weekly(demo_data::generate(demo)));
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;

        let looks_single = value.get("day").is_some() || value.get("open").is_some();
        if self.single_day || looks_single {
            let request = SingleDayRequest::from_value(value, self.day_label.as_deref())?;
            Ok(SolveRequest::SingleDay(request))
        } else {
            let input: ScheduleInput = serde_json::from_value(value)?;
            Ok(SolveRequest::Weekly(input))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("staff_scheduling=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = args.config();
    let request = args.request()?;

    #[cfg(feature = "console")]
    {
        staff_scheduling::console::print_banner();
        let (mode, days, workers) = match &request {
            SolveRequest::Weekly(input) => ("weekly", input.days.len(), input.workers.len()),
            SolveRequest::SingleDay(day) => ("single-day", 1, day.workers.len()),
        };
        staff_scheduling::console::print_request(mode, days, workers);
    }

    let started = Instant::now();
    let result = solve_async(request, config).await?;
    info!(status = result.status.as_str(), "Schedule ready");

    #[cfg(feature = "console")]
    {
        staff_scheduling::console::print_solving_ended(started.elapsed(), &result);
        staff_scheduling::console::print_attendance(&result);
    }
    #[cfg(not(feature = "console"))]
    let _ = started;

    let json = serde_json::to_string_pretty(&result)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}
