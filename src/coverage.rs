//! Per-slot staffing demand for one day.

use crate::domain::DayConfig;
use crate::error::ScheduleError;
use crate::horizon::{DaySpan, Horizon};
use crate::time::parse_time_range;

/// Demand for `day` as `[slot][role]` head counts.
///
/// Base counts apply to every slot; each peak adds its extras to the slots
/// its window touches. Roles absent from the base demand start at zero.
pub fn build_day_coverage(
    config: &DayConfig,
    horizon: &Horizon,
    day: &DaySpan,
) -> Result<Vec<Vec<u32>>, ScheduleError> {
    let roles = horizon.roles();
    let mut base = vec![0u32; roles.len()];
    for (role, &count) in &config.roles {
        let count = demand_count(&day.label, role, count)?;
        if let Some(r) = roles.position(role) {
            base[r] = count;
        }
    }

    let mut coverage = vec![base; day.slot_count];

    for (index, peak) in config.peaks.iter().enumerate() {
        let window = parse_time_range(&format!("{}-{}", peak.start, peak.end))
            .and_then(|range| range.ensure_ordered())
            .map_err(|source| ScheduleError::Peak {
                day: day.label.clone(),
                index,
                source,
            })?;

        let slots = horizon.slot_range(day, &window);
        for (role, &extra) in &peak.extra {
            let extra = demand_count(&day.label, role, extra)?;
            let Some(r) = roles.position(role) else {
                continue;
            };
            for slot in slots.clone() {
                coverage[slot][r] = coverage[slot][r].checked_add(extra).ok_or_else(|| {
                    ScheduleError::ModelOverflow(format!(
                        "day `{}`: demand for role `{}` exceeds {}",
                        day.label,
                        role,
                        u32::MAX
                    ))
                })?;
            }
        }
    }

    Ok(coverage)
}

fn demand_count(day: &str, role: &str, count: i64) -> Result<u32, ScheduleError> {
    u32::try_from(count).map_err(|_| ScheduleError::NegativeDemand {
        day: day.to_string(),
        role: role.to_string(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::RoleIndex;
    use crate::time::TimeRange;

    fn horizon_for(config: &DayConfig) -> Horizon {
        Horizon::single_day(
            "monday".to_string(),
            TimeRange::from_bounds(&config.open, &config.close).unwrap(),
            RoleIndex::from_days([config]),
            60,
        )
    }

    #[test]
    fn test_base_demand_fills_every_slot() {
        let config = DayConfig::new("09:00", "13:00")
            .with_role("cashier", 1)
            .with_role("helper", 2);
        let horizon = horizon_for(&config);
        let coverage = build_day_coverage(&config, &horizon, &horizon.days()[0]).unwrap();
        assert_eq!(coverage, vec![vec![1, 2]; 4]);
    }

    #[test]
    fn test_peaks_add_inside_their_window() {
        let config = DayConfig::new("09:00", "14:00")
            .with_role("cashier", 1)
            .with_peak("10:00", "12:00", [("cashier", 1)])
            .with_peak("11:30", "12:10", [("cashier", 2)]);
        let horizon = horizon_for(&config);
        let coverage = build_day_coverage(&config, &horizon, &horizon.days()[0]).unwrap();
        let cashier: Vec<u32> = coverage.iter().map(|slot| slot[0]).collect();
        assert_eq!(cashier, vec![1, 2, 4, 3, 1]);
    }

    #[test]
    fn test_peak_only_role_creates_demand() {
        let config = DayConfig::new("09:00", "12:00")
            .with_role("cashier", 1)
            .with_peak("10:00", "11:00", [("runner", 3)]);
        let horizon = horizon_for(&config);
        let runner = horizon.roles().position("runner").unwrap();
        let coverage = build_day_coverage(&config, &horizon, &horizon.days()[0]).unwrap();
        let demand: Vec<u32> = coverage.iter().map(|slot| slot[runner]).collect();
        assert_eq!(demand, vec![0, 3, 0]);
    }

    #[test]
    fn test_peak_outside_day_is_clipped() {
        let config = DayConfig::new("09:00", "11:00")
            .with_role("cashier", 1)
            .with_peak("10:00", "15:00", [("cashier", 1)]);
        let horizon = horizon_for(&config);
        let coverage = build_day_coverage(&config, &horizon, &horizon.days()[0]).unwrap();
        assert_eq!(coverage, vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_invalid_peaks_and_counts_rejected() {
        let inverted = DayConfig::new("09:00", "17:00")
            .with_role("cashier", 1)
            .with_peak("12:00", "10:00", [("cashier", 1)]);
        let horizon = horizon_for(&inverted);
        let err = build_day_coverage(&inverted, &horizon, &horizon.days()[0]).unwrap_err();
        assert!(matches!(err, ScheduleError::Peak { index: 0, .. }));

        let negative = DayConfig::new("09:00", "17:00").with_role("cashier", -1);
        let horizon = horizon_for(&negative);
        let err = build_day_coverage(&negative, &horizon, &horizon.days()[0]).unwrap_err();
        assert!(matches!(err, ScheduleError::NegativeDemand { count: -1, .. }));
    }

    #[test]
    fn test_overflowing_peak_demand_rejected() {
        let config = DayConfig::new("09:00", "11:00")
            .with_role("cashier", 1)
            .with_peak("10:00", "11:00", [("cashier", i64::from(u32::MAX))]);
        let horizon = horizon_for(&config);
        let err = build_day_coverage(&config, &horizon, &horizon.days()[0]).unwrap_err();
        assert!(matches!(err, ScheduleError::ModelOverflow(_)));
    }
}
