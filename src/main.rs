//! kb - Kanban task board CLI
//!
//! Track tasks across columns, reorder them cheaply, and ask what to work on
//! next.

use clap::Parser;
use kb::cli::Cli;
use kb::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}

// Tracing is opt-in via RUST_LOG, or `--verbose` for kb's own debug events.
// Invalid or oversized filters are ignored so startup never fails on them.
fn init_tracing(verbose: bool) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new(if verbose { "kb=debug" } else { "off" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
