//! Configuration loading and management
//!
//! Handles parsing of `.kb.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::position::{DEFAULT_GAP, DEFAULT_MIN_GAP};
use crate::storage::CONFIG_FILE;
use crate::task::{Column, Priority, TaskType};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Board storage and ordering settings
    #[serde(default)]
    pub board: BoardConfig,

    /// Defaults for new tasks
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Suggestion settings
    #[serde(default)]
    pub suggest: SuggestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Task ID prefix
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Minimum task ID suffix length
    #[serde(default = "default_id_min_len")]
    pub id_min_len: usize,

    /// Smallest gap between neighbouring positions before a column is renumbered
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,

    /// How long writers wait for the board lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_id_prefix() -> String {
    "kb".to_string()
}

fn default_id_min_len() -> usize {
    3
}

fn default_min_gap() -> f64 {
    DEFAULT_MIN_GAP
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_min_len: default_id_min_len(),
            min_gap: default_min_gap(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default = "default_column")]
    pub default_column: Column,

    #[serde(default = "default_priority")]
    pub default_priority: Priority,

    #[serde(default = "default_type")]
    pub default_type: TaskType,
}

fn default_column() -> Column {
    Column::Backlog
}

fn default_priority() -> Priority {
    Priority::Medium
}

fn default_type() -> TaskType {
    TaskType::Feature
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_column: default_column(),
            default_priority: default_priority(),
            default_type: default_type(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Suggestions shown when `--limit` is not given; 0 shows all
    #[serde(default = "default_suggest_limit")]
    pub default_limit: usize,
}

fn default_suggest_limit() -> usize {
    5
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            default_limit: default_suggest_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a `.kb.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a board root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.board.validate()
    }
}

impl BoardConfig {
    fn validate(&self) -> Result<()> {
        let prefix = self.id_prefix.trim();
        if prefix.is_empty() {
            return Err(Error::InvalidConfig(
                "board.id_prefix cannot be empty".to_string(),
            ));
        }
        if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(Error::InvalidConfig(
                "board.id_prefix must be alphanumeric".to_string(),
            ));
        }
        if !(3..=16).contains(&self.id_min_len) {
            return Err(Error::InvalidConfig(
                "board.id_min_len must be between 3 and 16".to_string(),
            ));
        }
        if !self.min_gap.is_finite() || self.min_gap <= 0.0 {
            return Err(Error::InvalidConfig(
                "board.min_gap must be a positive number".to_string(),
            ));
        }
        if self.min_gap >= DEFAULT_GAP / 2.0 {
            return Err(Error::InvalidConfig(format!(
                "board.min_gap must be smaller than {}",
                DEFAULT_GAP / 2.0
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "board.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
