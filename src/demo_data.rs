//! Demo data generators for staff scheduling.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{DayConfig, ScheduleInput, SingleDayRequest, Worker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                days: &["monday", "tuesday", "wednesday", "thursday", "friday"],
                open: "09:00",
                close: "21:00",
                roles: &["cashier", "stocker"],
                worker_count: 8,
                base_demand_distribution: vec![(1, 3.0), (2, 1.0)],
                extra_role_distribution: vec![(0, 3.0), (1, 1.0)],
                shift_templates: &["09:00-15:00", "15:00-21:00", "09:00-21:00", "11:00-19:00"],
                availability_rate: 0.8,
                max_hours_options: &[20.0, 30.0, 40.0],
            },
            DemoData::Large => DemoDataParameters {
                days: &[
                    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
                ],
                open: "08:00",
                close: "22:00",
                roles: &["cashier", "stocker", "supervisor"],
                worker_count: 20,
                base_demand_distribution: vec![(1, 2.0), (2, 2.0), (3, 1.0)],
                extra_role_distribution: vec![(0, 2.0), (1, 2.0), (2, 1.0)],
                shift_templates: &[
                    "08:00-14:00",
                    "14:00-22:00",
                    "08:00-22:00",
                    "10:00-18:00",
                    "12:00-20:00",
                ],
                availability_rate: 0.7,
                max_hours_options: &[16.0, 24.0, 32.0, 40.0],
            },
        }
    }
}

struct DemoDataParameters {
    days: &'static [&'static str],
    open: &'static str,
    close: &'static str,
    /// The first role is the front-of-house role that peaks add to.
    roles: &'static [&'static str],
    worker_count: usize,
    base_demand_distribution: Vec<(usize, f64)>,
    extra_role_distribution: Vec<(usize, f64)>,
    shift_templates: &'static [&'static str],
    availability_rate: f64,
    max_hours_options: &'static [f64],
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a weekly demo request for the given size.
pub fn generate(demo: DemoData) -> ScheduleInput {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let name_permutations = generate_name_permutations(&mut rng);

    let mut workers = Vec::with_capacity(params.worker_count);
    for i in 0..params.worker_count {
        let name = name_permutations[i % name_permutations.len()].clone();

        // One primary role plus a few extras
        let mut roles: Vec<&str> = Vec::new();
        if let Some(primary) = params.roles.choose(&mut rng) {
            roles.push(*primary);
        }
        let extra_count = pick_count(&mut rng, &params.extra_role_distribution);
        for role in params.roles.choose_multiple(&mut rng, extra_count.min(params.roles.len())) {
            if !roles.contains(role) {
                roles.push(*role);
            }
        }

        let max_hours = params.max_hours_options.choose(&mut rng).copied().unwrap_or(40.0);
        let mut worker = Worker::new(name)
            .with_id(i as i64 + 1)
            .with_roles(roles)
            .with_max_hours(max_hours);

        for day in params.days {
            if !rng.gen_bool(params.availability_rate) {
                continue;
            }
            if let Some(window) = params.shift_templates.choose(&mut rng) {
                worker = worker.available(*day, &[*window]);
            }
        }
        workers.push(worker);
    }

    let mut input = ScheduleInput::new(workers);
    for day in params.days {
        let mut config = DayConfig::new(params.open, params.close);
        for role in params.roles {
            let count = pick_count(&mut rng, &params.base_demand_distribution);
            config = config.with_role(*role, count as i64);
        }

        // Lunch and evening rushes at the front of the house
        let front = params.roles[0];
        config = config.with_peak("12:00", "14:00", [(front, 1)]);
        if rng.gen_bool(0.5) {
            config = config.with_peak("17:00", "19:00", [(front, 1)]);
        }
        input = input.with_day(*day, config);
    }

    input
}

/// The single-day example shop: four workers with prior hours this week.
pub fn single_day() -> SingleDayRequest {
    let day = DayConfig::new("09:00", "22:00")
        .with_role("cashier", 1)
        .with_role("helper", 2)
        .with_peak("10:00", "12:00", [("cashier", 1), ("helper", 1)])
        .with_peak("18:00", "21:00", [("helper", 1)]);

    let workers = vec![
        Worker::new("Asha")
            .with_roles(["cashier"])
            .with_max_hours(20.0)
            .with_prior_hours(4.0)
            .with_windows(&["09:00-15:00"]),
        Worker::new("Bharat")
            .with_roles(["helper"])
            .with_max_hours(28.0)
            .with_prior_hours(10.0)
            .with_windows(&["09:00-22:00"]),
        Worker::new("Chitra")
            .with_roles(["helper", "cashier"])
            .with_max_hours(24.0)
            .with_prior_hours(8.0)
            .with_windows(&["10:00-18:00", "11:00-20:00"]),
        Worker::new("Jay")
            .with_roles(["helper", "cashier"])
            .with_max_hours(30.0)
            .with_prior_hours(12.0)
            .with_windows(&["09:00-22:00"]),
    ];

    SingleDayRequest::new("day", day, workers)
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(1)
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Availability;
    use crate::problem::{Assembly, Problem};
    use std::collections::HashSet;

    #[test]
    fn test_generate_small() {
        let input = generate(DemoData::Small);

        assert_eq!(input.workers.len(), 8);
        assert_eq!(input.days.len(), 5);
        for day in input.days.values() {
            assert_eq!(day.roles.len(), 2);
            assert!(!day.peaks.is_empty());
        }
    }

    #[test]
    fn test_generate_large() {
        let input = generate(DemoData::Large);

        assert_eq!(input.workers.len(), 20);
        assert_eq!(input.days.len(), 7);
        assert!(input.days.values().all(|d| d.roles.len() == 3));
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate(DemoData::Small), generate(DemoData::Small));
    }

    #[test]
    fn test_workers_have_roles_and_unique_names() {
        let input = generate(DemoData::Large);
        let names: HashSet<&str> = input.workers.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names.len(), input.workers.len());

        for worker in &input.workers {
            assert!(!worker.roles.is_empty(), "Worker {} has no roles", worker.name);
        }
    }

    #[test]
    fn test_demo_data_from_str() {
        assert_eq!("SMALL".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("small".parse::<DemoData>(), Ok(DemoData::Small));
        assert_eq!("LARGE".parse::<DemoData>(), Ok(DemoData::Large));
        assert!("invalid".parse::<DemoData>().is_err());
        assert_eq!(list_demo_data(), vec!["SMALL", "LARGE"]);
    }

    #[test]
    fn test_demo_inputs_assemble() {
        for demo in [DemoData::Small, DemoData::Large] {
            let assembly = Problem::weekly(&generate(demo), 60).unwrap();
            assert!(matches!(assembly, Assembly::Ready(_)), "{} failed", demo.as_str());
        }
    }

    #[test]
    fn test_single_day_example() {
        let request = single_day();
        assert_eq!(request.day_label, "day");
        assert_eq!(request.workers.len(), 4);
        assert!(matches!(request.workers[2].availability, Availability::Windows(ref w) if w.len() == 2));

        let problem = match Problem::single_day(&request, 60).unwrap() {
            Assembly::Ready(problem) => problem,
            other => panic!("unexpected {:?}", other),
        };
        // cashier 1 plus 1 during 10:00-12:00.
        let cashier = problem.horizon.roles().position("cashier").unwrap();
        assert_eq!(problem.demand(0, 1, cashier), 2);
        assert_eq!(problem.workers[0].capacity_slots, 16);
    }
}
