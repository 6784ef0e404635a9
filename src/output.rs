//! Shared output formatting for kb CLI commands.
//!
//! Commands build a serializable payload plus a [`HumanOutput`] and hand both
//! to [`emit_success`] together with explicit [`OutputOptions`].

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "kb.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    sections: Vec<(String, Vec<String>)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            sections: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    /// Named group of lines rendered before the details, e.g. one per column.
    pub fn push_section(&mut self, title: impl Into<String>, items: Vec<String>) {
        self.sections.push((title.into(), items));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        println!("{}", success_envelope(command, data, human)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

/// JSON envelope printed by [`emit_success`] in `--json` mode.
pub fn success_envelope<T: Serialize>(
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<String> {
    #[derive(Serialize)]
    struct Envelope<'a, T: Serialize> {
        schema_version: &'static str,
        command: &'a str,
        status: &'static str,
        data: &'a T,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        next_steps: Vec<String>,
    }

    let payload = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "success",
        data,
        warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
        next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        println!("{}", error_envelope(command, err)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = error_next_steps(err).first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// JSON envelope printed by [`emit_error`] in `--json` mode.
pub fn error_envelope(command: &str, err: &Error) -> Result<String> {
    #[derive(Serialize)]
    struct Envelope<'a> {
        schema_version: &'static str,
        command: &'a str,
        status: &'static str,
        error: JsonError,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        next_steps: Vec<String>,
    }

    let payload = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        error: JsonError::from(err),
        next_steps: error_next_steps(err),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    push_summary(&mut lines, &output.summary);
    for (title, items) in &output.sections {
        push_group(&mut lines, title, items, "(empty)");
    }
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut positional = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--root" {
            args.next();
        } else if !arg.starts_with('-') {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let Some(command) = positional.next() else {
        return "kb".to_string();
    };

    if command == "task" {
        if let Some(sub) = positional.next() {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::BoardNotFound(_) => vec!["kb init".to_string()],
        Error::InvalidConfig(_) => vec!["fix .kb.toml then retry".to_string()],
        Error::TaskNotFound(_) => vec!["kb task list".to_string()],
        Error::AmbiguousTaskId { .. } => vec!["use more characters of the task id".to_string()],
        Error::DependencyCycle(_) => vec!["kb task unblock <id> --by <blocker>".to_string()],
        Error::LockFailed(_) => vec!["retry once the other kb process finishes".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    push_group(lines, title, items, "");
}

fn push_group(lines: &mut Vec<String>, title: &str, items: &[String], placeholder: &str) {
    lines.push(String::new());
    lines.push(format!("{title}:"));
    if items.is_empty() && !placeholder.is_empty() {
        lines.push(format!("  {placeholder}"));
    }
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn infers_command_names() {
        assert_eq!(infer_command_name(args(&[])), "kb");
        assert_eq!(infer_command_name(args(&["--json", "suggest"])), "suggest");
        assert_eq!(infer_command_name(args(&["task", "--json", "new", "x"])), "task new");
        assert_eq!(infer_command_name(args(&["task"])), "task");
        assert_eq!(infer_command_name(args(&["--root", "/tmp/b", "init"])), "init");
    }

    #[test]
    fn human_output_renders_sections_in_order() {
        let mut human = HumanOutput::new("Board");
        human.push_summary("Total", "1");
        human.push_section("todo", vec!["kb-abc Write docs".to_string()]);
        human.push_section("done", Vec::new());
        human.push_warning("careful");

        let text = format_human(&human);
        assert_eq!(
            text,
            "Board\n\nSummary:\n- Total: 1\n\ntodo:\n- kb-abc Write docs\n\ndone:\n  (empty)\n\nWarnings:\n- careful"
        );
    }

    #[test]
    fn success_envelope_carries_schema_and_warnings() {
        let mut human = HumanOutput::new("x");
        human.push_warning("stale");
        let raw = success_envelope("suggest", &serde_json::json!({ "total": 0 }), Some(&human))
            .expect("envelope");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["schema_version"], "kb.v1");
        assert_eq!(value["command"], "suggest");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["total"], 0);
        assert_eq!(value["warnings"][0], "stale");
        assert!(value.get("next_steps").is_none());
    }

    #[test]
    fn error_envelope_carries_kind_and_details() {
        let err = Error::TaskNotFound("kb-zzz".to_string());
        let raw = error_envelope("task show", &err).expect("envelope");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["status"], "error");
        assert_eq!(value["command"], "task show");
        assert_eq!(value["error"]["message"], "Task not found: kb-zzz");
        assert_eq!(value["error"]["code"], 2);
        assert_eq!(value["error"]["kind"], "user_error");
        assert_eq!(value["error"]["details"]["id"], "kb-zzz");
        assert_eq!(value["next_steps"][0], "kb task list");

        let err = Error::LockFailed(std::path::PathBuf::from("/tmp/b/.kb/tasks.json.lock"));
        let raw = error_envelope("task new", &err).expect("envelope");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["error"]["code"], 4);
        assert_eq!(value["error"]["kind"], "operation_failed");
    }
}
