mod support;

use predicates::str::contains;
use serde_json::Value;

fn column_ids(list: &Value, column: &str) -> Vec<String> {
    list["data"]["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .find(|entry| entry["column"] == column)
        .map(|entry| {
            entry["tasks"]
                .as_array()
                .expect("tasks")
                .iter()
                .map(|task| task["id"].as_str().expect("id").to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn new_task_uses_configured_defaults() {
    let board = support::TestBoard::init();

    let value = board.json(&["task", "new", "Write docs"]);
    assert_eq!(value["command"], "task new");
    let task = &value["data"]["task"];
    assert!(task["id"].as_str().expect("id").starts_with("kb-"));
    assert_eq!(task["title"], "Write docs");
    assert_eq!(task["type"], "feature");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["column"], "backlog");
    assert_eq!(task["position"], 1000.0);
    assert_eq!(value["data"]["renumbered"], false);
}

#[test]
fn new_task_accepts_flags_and_config_overrides() {
    let board = support::TestBoard::init();
    board.write_config(
        "[board]\nid_prefix = \"ops\"\n\n[tasks]\ndefault_column = \"todo\"\n",
    );

    let value = board.json(&[
        "task", "new", "Fix login", "--type", "bug", "-p", "urgent",
    ]);
    let task = &value["data"]["task"];
    assert!(task["id"].as_str().expect("id").starts_with("ops-"));
    assert_eq!(task["type"], "bug");
    assert_eq!(task["priority"], "urgent");
    assert_eq!(task["column"], "todo");

    let value = board.json(&["task", "new", "Ship it", "-c", "In-Progress"]);
    assert_eq!(value["data"]["task"]["column"], "in_progress");
}

#[test]
fn tasks_are_listed_in_position_order() {
    let board = support::TestBoard::init();
    let first = board.new_task("First", &["-c", "todo"]);
    let second = board.new_task("Second", &["-c", "todo"]);
    let top = board.new_task("Top", &["-c", "todo", "--at", "0"]);
    let middle = board.new_task("Middle", &["-c", "todo", "--at", "2"]);

    let list = board.json(&["task", "list", "-c", "todo"]);
    assert_eq!(list["data"]["total"], 4);
    assert_eq!(column_ids(&list, "todo"), vec![top, first, middle, second]);
    assert_eq!(list["data"]["columns"].as_array().expect("columns").len(), 1);
}

#[test]
fn move_places_task_at_target_index() {
    let board = support::TestBoard::init();
    let a = board.new_task("A", &["-c", "todo"]);
    let b = board.new_task("B", &["-c", "todo"]);
    let c = board.new_task("C", &["-c", "in_progress"]);

    let value = board.json(&["task", "move", &c, "todo", "--at", "1"]);
    assert_eq!(value["command"], "task move");
    assert_eq!(value["data"]["from"], "in_progress");
    assert_eq!(value["data"]["task"]["column"], "todo");
    assert_eq!(value["data"]["task"]["position"], 1500.0);

    let list = board.json(&["task", "list"]);
    assert_eq!(column_ids(&list, "todo"), vec![a.clone(), c, b]);
    assert!(column_ids(&list, "in_progress").is_empty());

    let value = board.json(&["task", "move", &a, "todo"]);
    assert_eq!(value["data"]["task"]["position"], 3000.0);
}

#[test]
fn list_filters_by_priority_and_search() {
    let board = support::TestBoard::init();
    board.new_task("Fix crash on save", &["-p", "high", "--type", "bug"]);
    board.new_task("Write release notes", &["--type", "docs"]);

    let list = board.json(&["task", "list", "-p", "high"]);
    assert_eq!(list["data"]["total"], 1);

    let list = board.json(&["task", "list", "-s", "RELEASE"]);
    assert_eq!(list["data"]["total"], 1);

    let list = board.json(&["task", "list", "--type", "chore"]);
    assert_eq!(list["data"]["total"], 0);
}

#[test]
fn block_unblock_and_done_resolution() {
    let board = support::TestBoard::init();
    let api = board.new_task("Build API", &["-c", "todo"]);
    let ui = board.new_task("Build UI", &["-c", "todo"]);

    let value = board.json(&["task", "block", &ui, "--by", &api]);
    assert_eq!(value["data"]["blocked_by"][0], api.as_str());

    board
        .cmd()
        .args(["task", "block", &api, "--by", &ui])
        .assert()
        .code(2)
        .stderr(contains("Dependency cycle"));

    let value = board.json(&["task", "unblock", &ui, "--by", &api]);
    assert_eq!(value["data"]["blocked_by"].as_array().expect("set").len(), 0);

    board.json(&["task", "block", &ui, "--by", &api]);
    let value = board.json(&["task", "move", &api, "done"]);
    assert_eq!(value["data"]["unblocked"][0], ui.as_str());

    let shown = board.json(&["task", "show", &ui]);
    assert_eq!(shown["command"], "task show");
    assert_eq!(shown["data"]["blocked_by"].as_array().expect("set").len(), 0);
}

#[test]
fn new_task_can_start_blocked() {
    let board = support::TestBoard::init();
    let api = board.new_task("Build API", &[]);
    let value = board.json(&["task", "new", "Build UI", "--blocked-by", &api]);
    assert_eq!(value["data"]["task"]["blocked_by"][0], api.as_str());
}

#[test]
fn show_accepts_unique_prefix() {
    let board = support::TestBoard::init();
    let id = board.new_task("Only task", &[]);
    let prefix = &id[..id.len() - 2];

    board
        .cmd()
        .args(["task", "show", prefix])
        .assert()
        .success()
        .stdout(contains("Only task"));
}

#[test]
fn human_list_renders_every_column() {
    let board = support::TestBoard::init();
    board.new_task("Write docs", &["-c", "review"]);

    board
        .cmd()
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(contains("backlog:\n  (empty)"))
        .stdout(contains("review:\n- kb-"))
        .stdout(contains("Write docs"));
}

#[test]
fn quiet_suppresses_human_output() {
    let board = support::TestBoard::init();
    board
        .cmd()
        .args(["--quiet", "task", "new", "Silent"])
        .assert()
        .success()
        .stdout("");
}
