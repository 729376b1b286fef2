//! Event rendering for the terminal.

use colored::Colorize;
use std::io::Write;
use std::sync::Arc;

use tandem_events::{EventCallback, RuntimeEvent};

/// Build the event callback for the configured verbosity.
///
/// Verbosity 0 shows errors only; 1 adds call progress; 2 streams text
/// deltas as they arrive.
pub(crate) fn event_renderer(verbosity: u8) -> EventCallback {
    Arc::new(move |event: RuntimeEvent| render(&event, verbosity))
}

fn render(event: &RuntimeEvent, verbosity: u8) {
    match event {
        RuntimeEvent::UserMessage { meta, prompt } => {
            if verbosity >= 1 {
                eprintln!(
                    "{} {} {}",
                    prefix(&meta.invocation_name, meta.depth).cyan(),
                    "<-".dimmed(),
                    prompt
                );
            }
        }
        RuntimeEvent::TextDelta { delta, .. } => {
            if verbosity >= 2 {
                eprint!("{delta}");
                let _ = std::io::stderr().flush();
            }
        }
        RuntimeEvent::ToolCall {
            meta,
            tool_name,
            call_id,
            args,
        } => {
            if verbosity >= 1 {
                eprintln!(
                    "{} {} {}({})",
                    prefix(&meta.invocation_name, meta.depth).cyan(),
                    format!("tool#{call_id}").dimmed(),
                    tool_name.bold(),
                    args.dimmed()
                );
            }
        }
        RuntimeEvent::ToolResult {
            meta,
            tool_name,
            call_id,
            result,
            duration_ms,
            is_error,
        } => {
            if verbosity >= 1 {
                let status = if *is_error { "failed".red() } else { "ok".green() };
                eprintln!(
                    "{} {} {} {} ({duration_ms}ms): {}",
                    prefix(&meta.invocation_name, meta.depth).cyan(),
                    format!("tool#{call_id}").dimmed(),
                    tool_name,
                    status,
                    result.dimmed()
                );
            }
        }
        RuntimeEvent::Status { meta, message } => {
            if verbosity >= 1 {
                eprintln!(
                    "{} {}",
                    prefix(&meta.invocation_name, meta.depth).cyan(),
                    message.dimmed()
                );
            }
        }
        RuntimeEvent::Error { meta, kind, message } => {
            eprintln!(
                "{} {} {}",
                prefix(&meta.invocation_name, meta.depth).cyan(),
                kind.red().bold(),
                message
            );
        }
    }
}

fn prefix(invocation: &str, depth: usize) -> String {
    format!("[{}{invocation}]", "  ".repeat(depth))
}
