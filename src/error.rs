//! Error types for kb
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, missing board, unknown task)
//! - 4: Operation failed (I/O, corrupt snapshot, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for kb CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for kb operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("No board found from {0}")]
    BoardNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Ambiguous task id '{input}': {candidates}")]
    AmbiguousTaskId { input: String, candidates: String },

    #[error("Dependency cycle: {0}")]
    DependencyCycle(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::BoardNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TaskNotFound(_)
            | Error::AmbiguousTaskId { .. }
            | Error::DependencyCycle(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable error category for the JSON error envelope
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            _ => "operation_failed",
        }
    }

    /// Structured context for the JSON error envelope
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::BoardNotFound(path) | Error::LockFailed(path) => {
                Some(serde_json::json!({ "path": path }))
            }
            Error::TaskNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::AmbiguousTaskId { input, candidates } => Some(serde_json::json!({
                "input": input,
                "candidates": candidates.split(", ").collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for kb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body of the JSON error envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
