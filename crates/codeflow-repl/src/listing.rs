//! Annotated source listings
//!
//! Renders a traced program line by line: `●` marks a line that recorded
//! state, `○` one that did not, followed by the right-aligned line number and
//! the source text. Lines with state end in a `// name = value, ...` comment
//! holding the variables of the last entry logged for that line.

use codeflow_core::{ExecutionLog, Variables};

pub const MARKER_TRACED: char = '●';
pub const MARKER_UNTRACED: char = '○';

/// Render `source` annotated with the last recorded state of each line
pub fn render_listing(source: &str, log: &ExecutionLog) -> String {
    let states = log.line_states();
    let total = source.lines().count();
    let width = total.max(1).to_string().len();

    let mut out = String::new();
    for (index, text) in source.lines().enumerate() {
        let number = (index + 1) as u32;
        let state = states.get(&number);
        let marker = if state.is_some() {
            MARKER_TRACED
        } else {
            MARKER_UNTRACED
        };

        let mut row = format!("{marker} {number:>width$} | {text}");
        if let Some(variables) = state.filter(|variables| !variables.is_empty()) {
            row = row.trim_end().to_string();
            row.push_str("  // ");
            row.push_str(&format_variables(variables));
        }
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// Render every log entry in execution order, one per line
pub fn render_trace(log: &ExecutionLog) -> String {
    let width = log.len().max(1).to_string().len();
    log.iter()
        .enumerate()
        .map(|(index, entry)| {
            let variables = serde_json::to_string(&entry.variables)
                .unwrap_or_else(|_| "{}".to_string());
            format!("#{index:<width$} line {} {variables}\n", entry.line)
        })
        .collect()
}

/// `a = 1, b = "two"`, in snapshot order
pub fn format_variables(variables: &Variables) -> String {
    variables
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}
