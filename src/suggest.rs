//! "What should I work on next?"
//!
//! Ranking is tiered and first-match-wins:
//!
//! 1. tasks already in progress
//! 2. urgent, unblocked tasks that have not been started
//! 3. high priority, unblocked tasks that have not been started
//! 4. unblocked tasks other tasks are waiting on, most waiters first
//!
//! A task is reported once, under the earliest tier that matched it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::task::{Column, Priority, Task};

/// Why a task was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    ContinueWork,
    UrgentUnblocked,
    HighUnblocked,
    Unblocks(usize),
}

impl Reason {
    /// 1-based tier the reason belongs to.
    pub fn tier(&self) -> u8 {
        match self {
            Reason::ContinueWork => 1,
            Reason::UrgentUnblocked => 2,
            Reason::HighUnblocked => 3,
            Reason::Unblocks(_) => 4,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::ContinueWork => f.write_str("Continue current work"),
            Reason::UrgentUnblocked => f.write_str("Urgent priority, unblocked"),
            Reason::HighUnblocked => f.write_str("High priority, unblocked"),
            Reason::Unblocks(count) => write!(f, "Unblocks {count} other task(s)"),
        }
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Suggestion<'a> {
    pub task: &'a Task,
    pub reason: Reason,
    pub tier: u8,
}

impl<'a> Suggestion<'a> {
    fn new(task: &'a Task, reason: Reason) -> Self {
        Self {
            task,
            reason,
            tier: reason.tier(),
        }
    }
}

/// Rank `tasks` into at most `limit` suggestions (`0` means no limit).
///
/// Tasks are considered in `created_at` order; tasks created at the same
/// instant keep the order they were passed in.
pub fn suggest(tasks: &[Task], limit: usize) -> Vec<Suggestion<'_>> {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by_key(|task| task.created_at);

    let unblocks = unblock_counts(&ordered);
    let mut ranking = Ranking::default();

    for task in ordered.iter().copied() {
        if task.column == Column::InProgress {
            ranking.push(task, Reason::ContinueWork);
        }
    }

    for (priority, reason) in [
        (Priority::Urgent, Reason::UrgentUnblocked),
        (Priority::High, Reason::HighUnblocked),
    ] {
        for task in ordered.iter().copied() {
            if task.priority == priority && is_startable(task) {
                ranking.push(task, reason);
            }
        }
    }

    let mut unblockers: Vec<(&Task, usize)> = ordered
        .iter()
        .copied()
        .filter(|task| !is_finishing(task) && task.is_unblocked())
        .filter_map(|task| {
            let count = unblocks.get(task.id.as_str()).copied().unwrap_or(0);
            (count > 0).then_some((task, count))
        })
        .collect();
    unblockers.sort_by(|left, right| right.1.cmp(&left.1));
    for (task, count) in unblockers {
        ranking.push(task, Reason::Unblocks(count));
    }

    let mut suggestions = ranking.suggestions;
    if limit > 0 {
        suggestions.truncate(limit);
    }
    suggestions
}

/// For each task id, how many tasks list it in `blocked_by`.
pub fn unblock_counts<'a>(tasks: &[&'a Task]) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for task in tasks {
        for dependency in &task.blocked_by {
            *counts.entry(dependency.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Default)]
struct Ranking<'a> {
    seen: HashSet<&'a str>,
    suggestions: Vec<Suggestion<'a>>,
}

impl<'a> Ranking<'a> {
    fn push(&mut self, task: &'a Task, reason: Reason) {
        if self.seen.insert(task.id.as_str()) {
            self.suggestions.push(Suggestion::new(task, reason));
        }
    }
}

fn is_finishing(task: &Task) -> bool {
    matches!(task.column, Column::Review | Column::Done)
}

// Not started, not finishing, nothing to wait for.
fn is_startable(task: &Task) -> bool {
    !is_finishing(task) && task.column != Column::InProgress && task.is_unblocked()
}
