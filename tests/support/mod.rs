#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Empty directory with no board in it.
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Directory with `kb init` already run.
    pub fn init() -> Self {
        let board = Self::empty();
        board.cmd().arg("init").assert().success();
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = kb_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.path().join(".kb.toml"), contents).expect("write config");
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run kb");
        assert!(
            output.status.success(),
            "kb {args:?} failed: {}",
            String::from_utf8_lossy(&output.stdout)
        );
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    /// Create a task and return its id.
    pub fn new_task(&self, title: &str, extra: &[&str]) -> String {
        let mut args = vec!["task", "new", title];
        args.extend_from_slice(extra);
        let value = self.json(&args);
        value["data"]["task"]["id"]
            .as_str()
            .expect("task id")
            .to_string()
    }
}

pub fn kb_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kb").expect("binary");
    cmd.env_remove("KB_ROOT").env_remove("RUST_LOG");
    cmd
}
