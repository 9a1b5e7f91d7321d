//! Backup suggestions for assigned blocks.

use std::cmp::Reverse;

use crate::decoder::{Decoded, SlotBlock};
use crate::dto::BackupCandidate;
use crate::problem::Problem;

/// Workers who could stand in for `block` of `role` on `day`.
///
/// A candidate is qualified for the role, available in every slot of the
/// block, idle in all of those slots, and not already in the block. The
/// list is ordered by remaining capacity (most first), then hours used
/// (fewest first), then name, and holds at most `limit` entries.
///
/// Remaining capacity and hours used are in slots. Single-day capacity
/// already excludes prior hours, and prior hours count as used.
pub fn rank_backups(
    problem: &Problem,
    decoded: &Decoded,
    day: usize,
    role: usize,
    block: &SlotBlock,
    limit: usize,
) -> Vec<BackupCandidate> {
    let mut candidates: Vec<(i64, i64, &str, usize)> = problem
        .workers
        .iter()
        .enumerate()
        .filter(|(w, worker)| {
            worker.qualified[role]
                && !block.workers.contains(&worker.name)
                && block
                    .slots
                    .clone()
                    .all(|s| worker.is_available(day, s) && !decoded.is_busy(*w, day, s))
        })
        .map(|(w, worker)| {
            let used = i64::from(decoded.hours[w]);
            let remaining = i64::from(worker.capacity_slots) - used;
            (remaining, used + i64::from(worker.prior_slots), worker.name.as_str(), w)
        })
        .collect();

    candidates.sort_by_key(|&(remaining, used, name, _)| (Reverse(remaining), used, name));
    candidates
        .into_iter()
        .take(limit)
        .map(|(_, _, _, w)| BackupCandidate {
            id: problem.workers[w].id.clone(),
            name: problem.workers[w].name.clone(),
        })
        .collect()
}
