//! Command-line interface for kb
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::storage::Storage;
use crate::task::TaskStore;

mod init;
mod suggest;
mod task;

/// kb - Kanban task board
///
/// Track tasks in columns, reorder them without renumbering, and ask what to
/// work on next.
#[derive(Parser, Debug)]
#[command(name = "kb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Board root (defaults to the nearest directory containing `.kb/`)
    #[arg(long, global = true, env = "KB_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a board in the current (or --root) directory
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Suggest what to work on next
    Suggest {
        /// Maximum suggestions (0 for all; defaults to suggest.default_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        /// Task title
        title: String,

        /// Task type: bug, feature, chore, docs
        #[arg(long = "type")]
        task_type: Option<String>,

        /// Priority: low, medium, high, urgent
        #[arg(short, long)]
        priority: Option<String>,

        /// Column: backlog, todo, in_progress, review, done
        #[arg(short, long)]
        column: Option<String>,

        /// Insert index in the column (0 = top, -1 = bottom)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        at: isize,

        /// Task this one waits on (repeatable)
        #[arg(long = "blocked-by")]
        blocked_by: Vec<String>,
    },

    /// List tasks grouped by column
    List {
        /// Only this column
        #[arg(short, long)]
        column: Option<String>,

        /// Only this task type
        #[arg(long = "type")]
        task_type: Option<String>,

        /// Only this priority
        #[arg(short, long)]
        priority: Option<String>,

        /// Case-insensitive title search
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one task
    Show {
        /// Task id or unique id prefix
        id: String,
    },

    /// Move a task to a column and index
    Move {
        /// Task id or unique id prefix
        id: String,

        /// Target column
        column: String,

        /// Index in the target column (0 = top, -1 = bottom)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        at: isize,
    },

    /// Mark a task as waiting on another
    Block {
        /// Task that waits
        id: String,

        /// Task it waits on
        #[arg(long = "by", required = true)]
        blocker: String,
    },

    /// Remove a dependency
    Unblock {
        /// Task that waits
        id: String,

        /// Task it no longer waits on
        #[arg(long = "by", required = true)]
        blocker: String,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Init => init::run(self.root, output),
            Commands::Suggest { limit } => suggest::run(suggest::SuggestOptions {
                limit,
                root: self.root,
                output,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    title,
                    task_type,
                    priority,
                    column,
                    at,
                    blocked_by,
                } => task::run_new(task::NewOptions {
                    title,
                    task_type,
                    priority,
                    column,
                    at,
                    blocked_by,
                    root: self.root,
                    output,
                }),
                TaskCommands::List {
                    column,
                    task_type,
                    priority,
                    search,
                } => task::run_list(task::ListOptions {
                    column,
                    task_type,
                    priority,
                    search,
                    root: self.root,
                    output,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    root: self.root,
                    output,
                }),
                TaskCommands::Move { id, column, at } => task::run_move(task::MoveOptions {
                    id,
                    column,
                    at,
                    root: self.root,
                    output,
                }),
                TaskCommands::Block { id, blocker } => task::run_block(task::BlockOptions {
                    id,
                    blocker,
                    root: self.root,
                    output,
                }),
                TaskCommands::Unblock { id, blocker } => {
                    task::run_unblock(task::BlockOptions {
                        id,
                        blocker,
                        root: self.root,
                        output,
                    })
                }
            },
        }
    }
}

fn start_dir(root: Option<PathBuf>) -> Result<PathBuf> {
    let start = match root {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    Ok(start.canonicalize().unwrap_or(start))
}

/// Open the store for the board that owns `root` (or the current directory).
fn open_store(root: Option<PathBuf>) -> Result<TaskStore> {
    let storage = Storage::discover(&start_dir(root)?)?;
    let config = Config::load_from_root(storage.root());
    Ok(TaskStore::new(storage, config))
}
