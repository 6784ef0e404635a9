//! kb - Kanban task board library
//!
//! This library provides the core functionality for the kb CLI tool.
//!
//! # Core Concepts
//!
//! - **Columns**: workflow stages (backlog, todo, in_progress, review, done)
//! - **Positions**: fractional ordering keys within a column
//! - **Dependencies**: `blocked_by` edges between tasks
//! - **Suggestions**: a tiered ranking of what to work on next
//!
//! # Module Organization
//!
//! - `position`: ordering keys for inserts and moves, with renumbering
//! - `suggest`: next-task ranking over a task snapshot
//! - `task`: typed task model and the board's record store
//! - `storage`: board directory layout and JSON I/O
//! - `lock`: file locking and atomic writes
//! - `config`: configuration loading from `.kb.toml`
//! - `output`: JSON envelopes and human-readable rendering
//! - `cli`: command-line interface using clap
//! - `error`: error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod position;
pub mod storage;
pub mod suggest;
pub mod task;

pub use error::{Error, Result};
