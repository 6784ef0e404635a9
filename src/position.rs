//! Fractional ordering keys for tasks within a column.
//!
//! Tasks carry a real-valued `position`. New keys are picked in the gap
//! between neighbours so an insert touches only the inserted task. Repeated
//! halving of the same gap eventually runs out of floating-point precision;
//! [`place`] detects that and asks the caller to renumber the column with
//! fresh, evenly spaced keys.

use std::cmp::Ordering;

use crate::task::Task;

/// Gap between consecutive keys in a freshly numbered column.
pub const DEFAULT_GAP: f64 = 1000.0;

/// Smallest gap `place` will leave between a new key and its neighbours.
pub const DEFAULT_MIN_GAP: f64 = 1e-6;

/// Key for appending below every existing position in a column.
pub fn next_position(existing: &[f64]) -> f64 {
    existing
        .iter()
        .copied()
        .max_by(f64::total_cmp)
        .map(|max| max + DEFAULT_GAP)
        .unwrap_or(DEFAULT_GAP)
}

/// Midpoint of two neighbouring keys. `before` must be less than `after`.
pub fn position_between(before: f64, after: f64) -> f64 {
    debug_assert!(
        before < after,
        "position_between requires before < after (got {before} and {after})"
    );
    (before + after) / 2.0
}

/// Key for inserting at `index` in a column whose positions are `sorted`.
///
/// - `0` puts the task on top: half of the current first key, or
///   [`DEFAULT_GAP`] in an empty column.
/// - Any negative index, or an index at or past the end, appends.
/// - Otherwise the key lands between `sorted[index - 1]` and `sorted[index]`.
///
/// `sorted` must be ascending; that is not checked.
pub fn position_at_index(sorted: &[f64], index: isize) -> f64 {
    match slot_for_index(sorted.len(), index) {
        0 => sorted.first().map(|first| first / 2.0).unwrap_or(DEFAULT_GAP),
        slot if slot == sorted.len() => next_position(sorted),
        slot => position_between(sorted[slot - 1], sorted[slot]),
    }
}

/// Stable ascending sort by `position`; equal keys keep their input order.
pub fn sort_by_position(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| left.position.total_cmp(&right.position));
}

/// Outcome of asking for a key at an index.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// The new key fits without touching neighbours.
    At(f64),
    /// The gap is exhausted. `positions` holds `len + 1` fresh keys for the
    /// whole column in display order; the inserted task takes `positions[slot]`
    /// and existing tasks take the rest, in their current order.
    Renumber { positions: Vec<f64>, slot: usize },
}

/// Like [`position_at_index`], but falls back to renumbering when the new
/// key would sit closer than `min_gap` to a neighbour.
pub fn place(sorted: &[f64], index: isize, min_gap: f64) -> Placement {
    let slot = slot_for_index(sorted.len(), index);
    let before = slot.checked_sub(1).and_then(|i| sorted.get(i).copied());
    let after = sorted.get(slot).copied();

    let candidate = match (before, after) {
        (Some(before), Some(after)) if before.partial_cmp(&after) != Some(Ordering::Less) => None,
        _ => Some(position_at_index(sorted, index)),
    };

    match candidate {
        Some(candidate) if fits(before, candidate, after, min_gap) => Placement::At(candidate),
        _ => Placement::Renumber {
            positions: rebalanced(sorted.len() + 1),
            slot,
        },
    }
}

/// `count` keys spaced [`DEFAULT_GAP`] apart, starting at [`DEFAULT_GAP`].
pub fn rebalanced(count: usize) -> Vec<f64> {
    (1..=count).map(|i| i as f64 * DEFAULT_GAP).collect()
}

fn slot_for_index(len: usize, index: isize) -> usize {
    usize::try_from(index).map(|i| i.min(len)).unwrap_or(len)
}

fn fits(before: Option<f64>, candidate: f64, after: Option<f64>, min_gap: f64) -> bool {
    if !candidate.is_finite() {
        return false;
    }
    let above = before.map(|b| candidate - b >= min_gap).unwrap_or(true);
    let below = after.map(|a| a - candidate >= min_gap).unwrap_or(true);
    above && below
}
