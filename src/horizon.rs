//! The slot grid shared by every stage of a run.
//!
//! A [`Horizon`] is built once per invocation and passed explicitly: it owns
//! the day-to-slot table and the role-to-index table.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use crate::domain::DayConfig;
use crate::time::{format_minutes, TimeRange};

/// Sorted role names with O(1) name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl RoleIndex {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let names: Vec<String> = sorted.into_iter().collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, positions }
    }

    /// Every role named in base demand or in a peak, across all days.
    pub fn from_days<'a>(days: impl IntoIterator<Item = &'a DayConfig>) -> Self {
        let mut names = BTreeSet::new();
        for day in days {
            names.extend(day.roles.keys().cloned());
            for peak in &day.peaks {
                names.extend(peak.extra.keys().cloned());
            }
        }
        Self::new(names)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// One day's placement on the slot grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySpan {
    pub label: String,
    /// Opening hours as configured.
    pub window: TimeRange,
    /// Absolute index of the day's first slot.
    pub first_slot: usize,
    pub slot_count: usize,
}

impl DaySpan {
    pub fn slots(&self) -> Range<usize> {
        0..self.slot_count
    }
}

/// Day and role tables for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    origin: u32,
    slot_minutes: u32,
    days: Vec<DaySpan>,
    roles: RoleIndex,
}

impl Horizon {
    /// Aligns every day to a grid starting at the earliest opening time.
    pub fn weekly(days: Vec<(String, TimeRange)>, roles: RoleIndex, slot_minutes: u32) -> Self {
        let origin = days.iter().map(|(_, w)| w.start).min().unwrap_or(0);
        Self::with_origin(origin, days, roles, slot_minutes)
    }

    /// A one-day grid starting at that day's opening time.
    pub fn single_day(label: String, window: TimeRange, roles: RoleIndex, slot_minutes: u32) -> Self {
        Self::with_origin(window.start, vec![(label, window)], roles, slot_minutes)
    }

    fn with_origin(
        origin: u32,
        days: Vec<(String, TimeRange)>,
        roles: RoleIndex,
        slot_minutes: u32,
    ) -> Self {
        let slot = slot_minutes.max(1);
        let days = days
            .into_iter()
            .map(|(label, window)| {
                let first_slot = (window.start.saturating_sub(origin) / slot) as usize;
                let end_slot = window.end.saturating_sub(origin).div_ceil(slot) as usize;
                DaySpan {
                    label,
                    window,
                    first_slot,
                    slot_count: end_slot.saturating_sub(first_slot),
                }
            })
            .collect();
        Self {
            origin,
            slot_minutes: slot,
            days,
            roles,
        }
    }

    pub fn days(&self) -> &[DaySpan] {
        &self.days
    }

    pub fn roles(&self) -> &RoleIndex {
        &self.roles
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Total slots over all days.
    pub fn total_slots(&self) -> usize {
        self.days.iter().map(|d| d.slot_count).sum()
    }

    /// Minute of day at which `slot` of `day` starts (`slot == slot_count`
    /// gives the end of the last slot).
    pub fn slot_start(&self, day: &DaySpan, slot: usize) -> u32 {
        self.origin + (day.first_slot + slot) as u32 * self.slot_minutes
    }

    pub fn slot_label(&self, day: &DaySpan, slot: usize) -> String {
        format_minutes(self.slot_start(day, slot))
    }

    /// Day-relative slots touched by `range`: floor at the start, ceiling at
    /// the end, clipped to the day.
    pub fn slot_range(&self, day: &DaySpan, range: &TimeRange) -> Range<usize> {
        let grid_start = self.slot_start(day, 0);
        let start = (range.start.saturating_sub(grid_start) / self.slot_minutes) as usize;
        let end = range.end.saturating_sub(grid_start).div_ceil(self.slot_minutes) as usize;
        let end = end.min(day.slot_count);
        start.min(end)..end
    }

    /// Converts whole hours to a slot count, rounding down.
    pub fn hours_to_slots(&self, hours: f64) -> u32 {
        if hours <= 0.0 {
            return 0;
        }
        (hours * 60.0 / self.slot_minutes as f64).floor() as u32
    }

    pub fn slots_to_hours(&self, slots: u32) -> f64 {
        slots as f64 * self.slot_minutes as f64 / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start_h: u32, end_h: u32) -> TimeRange {
        TimeRange::new(start_h * 60, end_h * 60)
    }

    #[test]
    fn test_roles_include_peak_only_roles() {
        let monday = DayConfig::new("09:00", "17:00")
            .with_role("cashier", 1)
            .with_peak("12:00", "14:00", [("runner", 1)]);
        let tuesday = DayConfig::new("09:00", "17:00").with_role("baker", 2);

        let roles = RoleIndex::from_days([&monday, &tuesday]);
        assert_eq!(roles.names(), &["baker", "cashier", "runner"]);
        assert_eq!(roles.position("runner"), Some(2));
        assert_eq!(roles.position("manager"), None);
    }

    #[test]
    fn test_weekly_days_align_to_earliest_open() {
        let horizon = Horizon::weekly(
            vec![
                ("monday".to_string(), window(9, 17)),
                ("tuesday".to_string(), window(11, 20)),
            ],
            RoleIndex::new(["cashier"]),
            60,
        );
        let tuesday = &horizon.days()[1];
        assert_eq!(tuesday.first_slot, 2);
        assert_eq!(tuesday.slot_count, 9);
        assert_eq!(horizon.slot_label(tuesday, 0), "11:00");
        assert_eq!(horizon.slot_label(tuesday, 9), "20:00");
        assert_eq!(horizon.total_slots(), 17);
    }

    #[test]
    fn test_partial_slots_round_outward() {
        let horizon = Horizon::single_day(
            "day".to_string(),
            TimeRange::new(9 * 60, 17 * 60 + 30),
            RoleIndex::new(["cashier"]),
            60,
        );
        let day = &horizon.days()[0];
        assert_eq!(day.slot_count, 9);
        assert_eq!(
            horizon.slot_range(day, &TimeRange::new(10 * 60 + 30, 12 * 60 + 15)),
            1..4
        );
        assert_eq!(horizon.slot_range(day, &TimeRange::new(8 * 60, 9 * 60)), 0..0);
        assert_eq!(horizon.slot_range(day, &TimeRange::new(16 * 60, 23 * 60)), 7..9);
    }

    #[test]
    fn test_hour_conversions() {
        let horizon = Horizon::single_day(
            "day".to_string(),
            window(9, 17),
            RoleIndex::default(),
            30,
        );
        assert_eq!(horizon.hours_to_slots(4.0), 8);
        assert_eq!(horizon.hours_to_slots(2.75), 5);
        assert_eq!(horizon.hours_to_slots(-1.0), 0);
        assert_eq!(horizon.slots_to_hours(5), 2.5);
    }
}
