//! kb task command implementations.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::position;
use crate::task::{Column, NewTask, Priority, Task, TaskFilter, TaskType};

pub struct NewOptions {
    pub title: String,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub column: Option<String>,
    pub at: isize,
    pub blocked_by: Vec<String>,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub column: Option<String>,
    pub task_type: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct ShowOptions {
    pub id: String,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct MoveOptions {
    pub id: String,
    pub column: String,
    pub at: isize,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

pub struct BlockOptions {
    pub id: String,
    pub blocker: String,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct TaskListColumn {
    column: Column,
    tasks: Vec<Task>,
}

#[derive(serde::Serialize)]
struct TaskListOutput {
    total: usize,
    columns: Vec<TaskListColumn>,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let defaults = &store.config().tasks;

    let task_type = parse_or(options.task_type.as_deref(), defaults.default_type)?;
    let priority = parse_or(options.priority.as_deref(), defaults.default_priority)?;
    let column = parse_or(options.column.as_deref(), defaults.default_column)?;

    let outcome = store.create(NewTask {
        title: options.title,
        task_type,
        priority,
        column,
        index: options.at,
        blocked_by: options.blocked_by,
    })?;

    let task = &outcome.task;
    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Column", task.column.to_string());
    human.push_summary("Position", task.position.to_string());
    if !task.blocked_by.is_empty() {
        human.push_summary("Blocked by", join_ids(task));
    }
    if outcome.renumbered {
        human.push_warning(format!("column {} was renumbered", task.column));
    }

    emit_success(options.output, "task new", &outcome, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let filter = TaskFilter {
        column: parse_opt::<Column>(options.column.as_deref())?,
        task_type: parse_opt::<TaskType>(options.task_type.as_deref())?,
        priority: parse_opt::<Priority>(options.priority.as_deref())?,
        text: options.search,
    };
    let tasks = store.list(&filter)?;

    let columns: Vec<TaskListColumn> = Column::ALL
        .iter()
        .copied()
        .filter(|column| filter.column.map_or(true, |wanted| wanted == *column))
        .map(|column| {
            let mut in_column: Vec<Task> = tasks
                .iter()
                .filter(|task| task.column == column)
                .cloned()
                .collect();
            position::sort_by_position(&mut in_column);
            TaskListColumn {
                column,
                tasks: in_column,
            }
        })
        .collect();

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    for entry in &columns {
        human.push_section(
            entry.column.to_string(),
            entry.tasks.iter().map(format_task_line).collect(),
        );
    }

    let output = TaskListOutput {
        total: tasks.len(),
        columns,
    };
    emit_success(options.output, "task list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let task = store.get(&options.id)?;

    let mut human = HumanOutput::new(format!("{} {}", task.id, task.title));
    human.push_summary("Type", task.task_type.to_string());
    human.push_summary("Priority", task.priority.to_string());
    human.push_summary("Column", task.column.to_string());
    human.push_summary("Position", task.position.to_string());
    if task.is_unblocked() {
        human.push_summary("Blocked by", "-");
    } else {
        human.push_summary("Blocked by", join_ids(&task));
    }
    human.push_summary("Created", task.created_at.to_rfc3339());
    human.push_summary("Updated", task.updated_at.to_rfc3339());

    emit_success(options.output, "task show", &task, Some(&human))
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let column: Column = options.column.parse()?;
    let outcome = store.move_task(&options.id, column, options.at)?;

    let task = &outcome.task;
    let mut human = HumanOutput::new("Task moved");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Column", format!("{} -> {}", outcome.from, task.column));
    human.push_summary("Position", task.position.to_string());
    if outcome.renumbered {
        human.push_warning(format!("column {} was renumbered", task.column));
    }
    for id in &outcome.unblocked {
        human.push_detail(format!("{id} no longer waits on {}", task.id));
    }

    emit_success(options.output, "task move", &outcome, Some(&human))
}

pub fn run_block(options: BlockOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let task = store.block(&options.id, &options.blocker)?;

    let mut human = HumanOutput::new("Dependency added");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Blocked by", join_ids(&task));

    emit_success(options.output, "task block", &task, Some(&human))
}

pub fn run_unblock(options: BlockOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let task = store.unblock(&options.id, &options.blocker)?;

    let mut human = HumanOutput::new("Dependency removed");
    human.push_summary("ID", task.id.clone());
    if task.is_unblocked() {
        human.push_summary("Blocked by", "-");
    } else {
        human.push_summary("Blocked by", join_ids(&task));
    }

    emit_success(options.output, "task unblock", &task, Some(&human))
}

fn parse_or<T: std::str::FromStr<Err = crate::error::Error>>(
    value: Option<&str>,
    default: T,
) -> Result<T> {
    Ok(parse_opt(value)?.unwrap_or(default))
}

fn parse_opt<T: std::str::FromStr<Err = crate::error::Error>>(
    value: Option<&str>,
) -> Result<Option<T>> {
    value.map(str::parse).transpose()
}

fn join_ids(task: &Task) -> String {
    task.blocked_by
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!(
        "{} [{}][{}] {}",
        task.id, task.priority, task.task_type, task.title
    );
    if !task.is_unblocked() {
        line.push_str(&format!(" (blocked by: {})", join_ids(task)));
    }
    line
}
