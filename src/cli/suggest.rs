//! kb suggest command implementation.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::suggest::{self, Suggestion};
use crate::task::TaskFilter;

pub struct SuggestOptions {
    pub limit: Option<usize>,
    pub root: Option<PathBuf>,
    pub output: OutputOptions,
}

#[derive(serde::Serialize)]
struct SuggestOutput<'a> {
    total: usize,
    suggestions: Vec<Suggestion<'a>>,
}

pub fn run(options: SuggestOptions) -> Result<()> {
    let store = super::open_store(options.root)?;
    let limit = options
        .limit
        .unwrap_or(store.config().suggest.default_limit);
    let tasks = store.list(&TaskFilter::default())?;
    let suggestions = suggest::suggest(&tasks, limit);

    let mut human = if suggestions.is_empty() {
        HumanOutput::new("No suggestions")
    } else {
        HumanOutput::new("Suggestions")
    };
    for (rank, suggestion) in suggestions.iter().enumerate() {
        human.push_detail(format!(
            "{}. {} {}: {}",
            rank + 1,
            suggestion.task.id,
            suggestion.task.title,
            suggestion.reason
        ));
    }
    if suggestions.is_empty() {
        human.push_next_step("kb task new \"<title>\" --priority high");
    }

    let output = SuggestOutput {
        total: suggestions.len(),
        suggestions,
    };
    emit_success(options.output, "suggest", &output, Some(&human))
}
