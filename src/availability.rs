//! Rasterizes availability windows onto a day's slots.

use crate::horizon::{DaySpan, Horizon};
use crate::time::TimeRange;

/// Marks every slot of `day` touched by any of `windows`.
///
/// Windows are clamped to the day's opening hours first, so parts outside
/// them are ignored. Overlapping windows simply mark the same slots.
pub fn encode_availability(windows: &[TimeRange], horizon: &Horizon, day: &DaySpan) -> Vec<bool> {
    let mut slots = vec![false; day.slot_count];
    for window in windows {
        let Some(inside) = window.clamp_to(&day.window) else {
            continue;
        };
        for slot in horizon.slot_range(day, &inside) {
            slots[slot] = true;
        }
    }
    slots
}
