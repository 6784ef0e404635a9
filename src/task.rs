//! Task model and record store for kb.
//!
//! The board keeps every task in a single snapshot at `.kb/tasks.json`.
//! Writers take the board lock, reload the snapshot, apply one change, and
//! write it back atomically, so position allocation is serialized across
//! concurrent `kb` processes.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::position::{self, Placement};
use crate::storage::Storage;

const TASKS_SCHEMA_VERSION: &str = "kb.tasks.v1";
const ULID_TIME_LEN: usize = 10;
const ULID_RANDOM_LEN: usize = 16;
const ID_ATTEMPTS_PER_LEN: usize = 32;

fn normalize_label(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

macro_rules! labelled_enum {
    ($name:ident, $what:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(value: &str) -> Result<Self> {
                let normalized = normalize_label(value);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str() == normalized)
                    .ok_or_else(|| {
                        let expected: Vec<&str> =
                            $name::ALL.iter().map(|candidate| candidate.as_str()).collect();
                        Error::InvalidArgument(format!(
                            "unknown {} '{}' (expected {})",
                            $what,
                            value.trim(),
                            expected.join("|")
                        ))
                    })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Bug,
    Feature,
    Chore,
    Docs,
}

labelled_enum!(TaskType, "task type", {
    Bug => "bug",
    Feature => "feature",
    Chore => "chore",
    Docs => "docs",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

labelled_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

/// Workflow stage. Variants are declared in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

labelled_enum!(Column, "column", {
    Backlog => "backlog",
    Todo => "todo",
    InProgress => "in_progress",
    Review => "review",
    Done => "done",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: Priority,
    pub column: Column,
    pub position: f64,
    #[serde(default)]
    pub blocked_by: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_unblocked(&self) -> bool {
        self.blocked_by.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
}

impl TaskSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: Vec::new(),
        }
    }
}

/// Bulk-read filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub column: Option<Column>,
    pub task_type: Option<TaskType>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the title
    pub text: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.column.is_some_and(|column| column != task.column) {
            return false;
        }
        if self.task_type.is_some_and(|task_type| task_type != task.task_type) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != task.priority) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => task
                .title
                .to_lowercase()
                .contains(&text.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub task_type: TaskType,
    pub priority: Priority,
    pub column: Column,
    /// Insert index within the column; negative or past the end appends
    pub index: isize,
    pub blocked_by: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub task: Task,
    pub renumbered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub task: Task,
    pub from: Column,
    pub renumbered: bool,
    /// Tasks whose `blocked_by` no longer lists the moved task
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unblocked: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    storage: Storage,
    config: Config,
}

impl TaskStore {
    pub fn new(storage: Storage, config: Config) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create the board directory and an empty snapshot. Returns whether the
    /// snapshot was newly created.
    pub fn init(&self) -> Result<bool> {
        self.storage.init()?;
        let path = self.storage.tasks_file();
        if path.exists() {
            return Ok(false);
        }
        self.storage.write_json(&path, &TaskSnapshot::empty())?;
        Ok(true)
    }

    pub fn snapshot(&self) -> Result<TaskSnapshot> {
        let snapshot = self
            .storage
            .read_json_optional::<TaskSnapshot>(&self.storage.tasks_file())?
            .unwrap_or_else(TaskSnapshot::empty);
        if snapshot.schema_version != TASKS_SCHEMA_VERSION {
            return Err(Error::OperationFailed(format!(
                "unsupported task snapshot version '{}' (expected {})",
                snapshot.schema_version, TASKS_SCHEMA_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// All tasks matching `filter`, oldest first.
    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut tasks = self.snapshot()?.tasks;
        tasks.retain(|task| filter.matches(task));
        sort_by_creation(&mut tasks);
        Ok(tasks)
    }

    pub fn get(&self, input: &str) -> Result<Task> {
        let snapshot = self.snapshot()?;
        let id = resolve_in(&snapshot.tasks, input)?;
        snapshot
            .tasks
            .into_iter()
            .find(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))
    }

    pub fn resolve_task_id(&self, input: &str) -> Result<String> {
        resolve_in(&self.snapshot()?.tasks, input)
    }

    pub fn create(&self, new: NewTask) -> Result<CreateOutcome> {
        let title = new.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidArgument("title cannot be empty".to_string()));
        }

        let min_gap = self.config.board.min_gap;
        let prefix = self.config.board.id_prefix.trim().to_string();
        let min_len = self.config.board.id_min_len;

        self.update(|tasks| {
            // Finished blockers are already resolved.
            let mut blocked_by = BTreeSet::new();
            for input in &new.blocked_by {
                let blocker = resolve_in(tasks, input)?;
                if tasks[index_of(tasks, &blocker)?].column != Column::Done {
                    blocked_by.insert(blocker);
                }
            }

            let now = Utc::now();
            let task = Task {
                id: generate_task_id(tasks, &prefix, min_len),
                title,
                task_type: new.task_type,
                priority: new.priority,
                column: new.column,
                position: 0.0,
                blocked_by,
                created_at: now,
                updated_at: now,
            };
            tasks.push(task);
            let target = tasks.len() - 1;
            let renumbered = place_in_column(tasks, target, new.index, min_gap);

            let task = tasks[target].clone();
            debug!(id = %task.id, column = %task.column, position = task.position, "task created");
            Ok(CreateOutcome { task, renumbered })
        })
    }

    /// Move a task to `index` within `column` (which may be its current one).
    /// Entering `done` resolves the task as a dependency of every other task.
    pub fn move_task(&self, input: &str, column: Column, index: isize) -> Result<MoveOutcome> {
        let min_gap = self.config.board.min_gap;
        self.update(|tasks| {
            let id = resolve_in(tasks, input)?;
            let target = index_of(tasks, &id)?;
            let from = tasks[target].column;

            tasks[target].column = column;
            tasks[target].updated_at = Utc::now();
            let renumbered = place_in_column(tasks, target, index, min_gap);

            let mut unblocked = Vec::new();
            if column == Column::Done {
                let now = Utc::now();
                for task in tasks.iter_mut() {
                    if task.blocked_by.remove(&id) {
                        task.updated_at = now;
                        unblocked.push(task.id.clone());
                    }
                }
                if !unblocked.is_empty() {
                    debug!(%id, dependants = unblocked.len(), "resolved dependency");
                }
            }

            Ok(MoveOutcome {
                task: tasks[target].clone(),
                from,
                renumbered,
                unblocked,
            })
        })
    }

    /// Record that `input` waits on `blocker`.
    pub fn block(&self, input: &str, blocker: &str) -> Result<Task> {
        self.update(|tasks| {
            let id = resolve_in(tasks, input)?;
            let blocker = resolve_in(tasks, blocker)?;
            if id == blocker {
                return Err(Error::InvalidArgument(format!(
                    "task {id} cannot block itself"
                )));
            }
            if tasks[index_of(tasks, &blocker)?].column == Column::Done {
                return Err(Error::InvalidArgument(format!(
                    "task {blocker} is already done"
                )));
            }
            if let Some(path) = dependency_path(tasks, &blocker, &id) {
                return Err(Error::DependencyCycle(format!(
                    "{id} -> {}",
                    path.join(" -> ")
                )));
            }

            let target = index_of(tasks, &id)?;
            if tasks[target].blocked_by.insert(blocker) {
                tasks[target].updated_at = Utc::now();
            }
            Ok(tasks[target].clone())
        })
    }

    pub fn unblock(&self, input: &str, blocker: &str) -> Result<Task> {
        self.update(|tasks| {
            let id = resolve_in(tasks, input)?;
            let target = index_of(tasks, &id)?;

            // A blocker that no longer exists can still be removed by exact id.
            let blocker = if tasks[target].blocked_by.contains(blocker.trim()) {
                blocker.trim().to_string()
            } else {
                resolve_in(tasks, blocker)?
            };
            if !tasks[target].blocked_by.remove(&blocker) {
                return Err(Error::InvalidArgument(format!(
                    "task {id} is not blocked by {blocker}"
                )));
            }
            tasks[target].updated_at = Utc::now();
            Ok(tasks[target].clone())
        })
    }

    // Lock, reload, mutate, write back.
    fn update<T>(&self, apply: impl FnOnce(&mut Vec<Task>) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(
            self.storage.tasks_lock_file(),
            self.config.board.lock_timeout_ms,
        )?;
        let mut snapshot = self.snapshot()?;
        let value = apply(&mut snapshot.tasks)?;
        snapshot.generated_at = Utc::now();
        self.storage.write_json(&self.storage.tasks_file(), &snapshot)?;
        Ok(value)
    }
}

/// Oldest first; ids break timestamp ties.
pub fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Give `tasks[target]` a position at `index` among the other tasks in its
/// column. Returns whether the column had to be renumbered.
fn place_in_column(tasks: &mut [Task], target: usize, index: isize, min_gap: f64) -> bool {
    let column = tasks[target].column;
    let mut siblings: Vec<usize> = (0..tasks.len())
        .filter(|&i| i != target && tasks[i].column == column)
        .collect();
    siblings.sort_by(|&left, &right| tasks[left].position.total_cmp(&tasks[right].position));
    let sorted: Vec<f64> = siblings.iter().map(|&i| tasks[i].position).collect();

    match position::place(&sorted, index, min_gap) {
        Placement::At(value) => {
            tasks[target].position = value;
            false
        }
        Placement::Renumber { positions, slot } => {
            debug!(
                column = %column,
                tasks = positions.len(),
                "position gap exhausted, renumbering column"
            );
            siblings.insert(slot, target);
            for (&i, value) in siblings.iter().zip(positions) {
                tasks[i].position = value;
            }
            true
        }
    }
}

fn index_of(tasks: &[Task], id: &str) -> Result<usize> {
    tasks
        .iter()
        .position(|task| task.id == id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

/// Path of ids from `from` to `to` following `blocked_by` edges, if any.
fn dependency_path(tasks: &[Task], from: &str, to: &str) -> Option<Vec<String>> {
    let edges: HashMap<&str, &BTreeSet<String>> = tasks
        .iter()
        .map(|task| (task.id.as_str(), &task.blocked_by))
        .collect();

    let mut seen = HashSet::new();
    let mut stack = vec![vec![from.to_string()]];
    while let Some(path) = stack.pop() {
        let Some(node) = path.last() else {
            continue;
        };
        if node == to {
            return Some(path);
        }
        if !seen.insert(node.clone()) {
            continue;
        }
        for next in edges.get(node.as_str()).into_iter().flat_map(|deps| deps.iter()) {
            let mut extended = path.clone();
            extended.push(next.clone());
            stack.push(extended);
        }
    }
    None
}

fn suffix_from_id(id: &str) -> &str {
    id.split_once('-').map(|(_, suffix)| suffix).unwrap_or(id)
}

fn prefix_from_id(id: &str) -> Option<&str> {
    id.split_once('-').map(|(prefix, _)| prefix)
}

fn resolve_in(tasks: &[Task], input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
    }

    let wanted = trimmed.to_lowercase();
    let wanted_suffix = suffix_from_id(&wanted);
    let wanted_prefix = prefix_from_id(&wanted);
    let mut exact = Vec::new();
    let mut prefixed = Vec::new();

    for task in tasks {
        let id = task.id.to_lowercase();
        if wanted_prefix.is_some() && wanted_prefix != prefix_from_id(&id) {
            continue;
        }
        let suffix = suffix_from_id(&id);
        if id == wanted || suffix == wanted {
            exact.push(task.id.clone());
        } else if suffix.starts_with(wanted_suffix) {
            prefixed.push(task.id.clone());
        }
    }

    let mut candidates = if exact.is_empty() { prefixed } else { exact };
    candidates.sort();
    candidates.dedup();
    match candidates.len() {
        0 => Err(Error::TaskNotFound(trimmed.to_string())),
        1 => Ok(candidates.remove(0)),
        _ => Err(Error::AmbiguousTaskId {
            input: trimmed.to_string(),
            candidates: candidates.join(", "),
        }),
    }
}

/// `<prefix>-<suffix>`, where the suffix is the leading random characters of
/// a fresh ULID, lengthened until it is unused on the board.
fn generate_task_id(tasks: &[Task], prefix: &str, min_len: usize) -> String {
    let existing: HashSet<String> = tasks
        .iter()
        .map(|task| suffix_from_id(&task.id.to_lowercase()).to_string())
        .collect();

    let mut len = min_len.clamp(1, ULID_RANDOM_LEN);
    loop {
        for _ in 0..ID_ATTEMPTS_PER_LEN {
            let ulid = Ulid::new().to_string().to_lowercase();
            let suffix = &ulid[ULID_TIME_LEN..ULID_TIME_LEN + len];
            if !existing.contains(suffix) {
                return format!("{prefix}-{suffix}");
            }
        }
        if len < ULID_RANDOM_LEN {
            len += 1;
        }
    }
}
