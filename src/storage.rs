//! Storage layer for kb
//!
//! A board is a directory containing a `.kb/` folder:
//!
//! ```text
//! <root>/
//!   .kb.toml              # Optional board configuration
//!   .kb/
//!     tasks.json          # Task snapshot
//!     tasks.json.lock     # Writer lock for the snapshot
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::lock;

/// Name of the board directory
pub const BOARD_DIR: &str = ".kb";

/// Name of the board configuration file, next to the board directory
pub const CONFIG_FILE: &str = ".kb.toml";

const TASKS_FILE: &str = "tasks.json";

/// Storage manager for a board
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Find the board that owns `start`, walking up through its parents.
    pub fn discover(start: &Path) -> Result<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(BOARD_DIR).is_dir())
            .map(|dir| Self::new(dir.to_path_buf()))
            .ok_or_else(|| Error::BoardNotFound(start.to_path_buf()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn board_dir(&self) -> PathBuf {
        self.root.join(BOARD_DIR)
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.board_dir().join(TASKS_FILE)
    }

    pub fn tasks_lock_file(&self) -> PathBuf {
        self.board_dir().join(format!("{TASKS_FILE}.lock"))
    }

    /// Create the board directory. Returns whether it was newly created.
    pub fn init(&self) -> Result<bool> {
        let dir = self.board_dir();
        if dir.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&dir)?;
        Ok(true)
    }

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Like [`Storage::read_json`], but a missing file reads as `None`.
    pub fn read_json_optional<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
