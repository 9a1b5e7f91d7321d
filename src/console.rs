//! Colorful console output for scheduling runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::dto::{ScheduleResult, ScheduleStatus};

/// ASCII art banner for startup.
pub fn print_banner() {
    let banner = r#"
  ____  _         __  __
 / ___|| |_ __ _ / _|/ _|
 \___ \| __/ _` | |_| |_
  ___) | || (_| |  _|  _|
 |____/ \__\__,_|_| |_|
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Staff Scheduling".bright_cyan()
    );
}

/// Prints the size of the request.
pub fn print_request(mode: &str, days: usize, workers: usize) {
    println!(
        "{} {} {} Request: mode ({}), days ({}), workers ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        mode.white().bold(),
        days.to_formatted_string(&Locale::en).bright_yellow(),
        workers.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints the size of an encoded model.
pub fn print_model(variables: usize, constraints: usize, slots: usize) {
    println!(
        "{} {} {} Model: variables ({}), constraints ({}), slots ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Encoder]".bright_cyan(),
        variables.to_formatted_string(&Locale::en).bright_yellow(),
        constraints.to_formatted_string(&Locale::en).bright_yellow(),
        slots.to_formatted_string(&Locale::en).bright_yellow()
    );
}

/// Prints the summary box for a finished run.
pub fn print_solving_ended(total_duration: Duration, result: &ScheduleResult) {
    println!(
        "{} {} {} Solving ended: time spent ({}), status ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(total_duration).yellow(),
        format_status(result.status)
    );

    // 60 chars wide, 56 char content area
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let status_text = match result.status {
        ScheduleStatus::Optimal => "✓ OPTIMAL SCHEDULE",
        ScheduleStatus::Feasible => "✓ FEASIBLE SCHEDULE (time limit reached)",
        ScheduleStatus::Infeasible => "✗ NO SCHEDULE FOUND",
        ScheduleStatus::NoDays => "✗ NO DAYS TO SCHEDULE",
        ScheduleStatus::NoEmployees => "✗ NO WORKERS TO SCHEDULE",
    };
    let status_colored = if result.status.has_schedule() {
        status_text.bright_green().bold().to_string()
    } else {
        status_text.bright_red().bold().to_string()
    };
    let status_padding = 56usize.saturating_sub(status_text.chars().count());
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    if let Some(schedule) = &result.schedule {
        let summary = &schedule.fairness_summary;
        box_row("Workers Used:", &summary.workers_used.to_string());
        box_row(
            "Hours Range:",
            &format!("{:.1}h - {:.1}h", summary.min_hours, summary.max_hours),
        );
        box_row(
            "Unmet Slots:",
            &summary.total_unmet.to_formatted_string(&Locale::en),
        );
    }
    box_row("Solving Time:", &format!("{:.2}s", total_duration.as_secs_f64()));

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

/// Prints each worker's intervals, one line per worker and day.
pub fn print_attendance(result: &ScheduleResult) {
    let Some(schedule) = &result.schedule else {
        return;
    };
    let summary = &schedule.fairness_summary;

    for (worker, days) in &schedule.attendance {
        let hours = summary.hours_by_worker.get(worker).copied().unwrap_or(0.0);
        if days.is_empty() {
            println!("  {:<16} {}", worker.white().bold(), "-".bright_black());
            continue;
        }
        for (day, intervals) in days {
            let spans: Vec<String> = intervals
                .iter()
                .map(|i| format!("{}-{}", i.start, i.end))
                .collect();
            println!(
                "  {:<16} {:<10} {}  {}",
                worker.white().bold(),
                day.bright_cyan(),
                spans.join("; "),
                format!("({:.1}h)", hours).bright_black()
            );
        }
    }

    if let (Some(prior), Some(cumulative)) = (&summary.prior_hours, &summary.cumulative_hours) {
        println!();
        for (worker, before) in prior {
            let total = cumulative.get(worker).copied().unwrap_or(*before);
            println!(
                "  {:<16} prior {:.1}h, cumulative {}",
                worker.white(),
                before,
                format!("{:.1}h", total).bright_yellow()
            );
        }
    }
    println!();
}

fn box_row(label: &str, value: &str) {
    println!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    );
}

fn format_status(status: ScheduleStatus) -> String {
    match status {
        ScheduleStatus::Optimal => status.as_str().bright_green().to_string(),
        ScheduleStatus::Feasible => status.as_str().yellow().to_string(),
        _ => status.as_str().bright_red().to_string(),
    }
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
