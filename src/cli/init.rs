//! kb init command implementation
//!
//! Creates the board directory, an empty task snapshot, and a default
//! `.kb.toml` when none exists.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{Storage, BOARD_DIR, CONFIG_FILE};
use crate::task::TaskStore;

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    board_dir: bool,
    tasks: bool,
    config: bool,
}

pub fn run(root: Option<PathBuf>, output: OutputOptions) -> Result<()> {
    let root = super::start_dir(root)?;
    let storage = Storage::new(root.clone());

    let created_board_dir = storage.init()?;
    let created_config = ensure_config(&storage)?;
    let config = Config::load_from_root(&root);
    let store = TaskStore::new(storage, config);
    let created_tasks = store.init()?;

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            board_dir: created_board_dir,
            tasks: created_tasks,
            config: created_config,
        },
    };

    let mut created = Vec::new();
    if created_board_dir {
        created.push(format!("{BOARD_DIR}/"));
    }
    if created_tasks {
        created.push(format!("{BOARD_DIR}/tasks.json"));
    }
    if created_config {
        created.push(CONFIG_FILE.to_string());
    }

    let header = if created.is_empty() {
        "Board already initialized"
    } else {
        "Board initialized"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Root", root.display().to_string());
    if !created.is_empty() {
        human.push_summary("Created", created.join(", "));
    }
    human.push_next_step("kb task new \"<title>\"");

    emit_success(output, "init", &report, Some(&human))
}

fn ensure_config(storage: &Storage) -> Result<bool> {
    let path = storage.config_file();
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(&path)?;
    Ok(true)
}
