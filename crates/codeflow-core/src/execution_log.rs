//! Execution log and run result types.
//!
//! These are the wire format handed to presentation layers:
//! `{ instrumented, log: [{ line, variables, timestamp }], error? }`.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Variable snapshot: name to value, in the order the names were declared
pub type Variables = IndexMap<String, serde_json::Value>;

/// One `trackLine` call observed while the program ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// Source line, or 0 when the statement had no position
    pub line: u32,
    pub variables: Variables,
    /// Milliseconds since the Unix epoch, non-decreasing within one log
    pub timestamp: i64,
}

impl ExecutionLogEntry {
    pub fn new(line: u32, variables: Variables, timestamp: i64) -> Self {
        Self {
            line,
            variables,
            timestamp,
        }
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.variables.get(name)
    }
}

/// Ordered, append-only record of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLog(Vec<ExecutionLogEntry>);

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: ExecutionLogEntry) {
        self.0.push(entry);
    }

    pub fn entries(&self) -> &[ExecutionLogEntry] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionLogEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&ExecutionLogEntry> {
        self.0.last()
    }

    /// Every entry recorded for `line`, in execution order
    pub fn entries_for_line(&self, line: u32) -> Vec<&ExecutionLogEntry> {
        self.0.iter().filter(|entry| entry.line == line).collect()
    }

    /// Distinct lines in the order they were first hit
    pub fn lines(&self) -> Vec<u32> {
        let mut seen = Vec::new();
        for entry in &self.0 {
            if !seen.contains(&entry.line) {
                seen.push(entry.line);
            }
        }
        seen
    }

    /// Variables of the last entry recorded for each line
    pub fn line_states(&self) -> BTreeMap<u32, &Variables> {
        self.0
            .iter()
            .map(|entry| (entry.line, &entry.variables))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ExecutionLog {
    type Item = &'a ExecutionLogEntry;
    type IntoIter = std::slice::Iter<'a, ExecutionLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<ExecutionLogEntry> for ExecutionLog {
    fn from_iter<I: IntoIterator<Item = ExecutionLogEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Outcome of one instrument-and-run call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Printed instrumented program, empty if the transform failed
    pub instrumented: String,
    pub log: ExecutionLog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunResult {
    pub(crate) fn success(instrumented: String, log: ExecutionLog) -> Self {
        Self {
            instrumented,
            log,
            error: None,
        }
    }

    pub(crate) fn transform_failure(message: String) -> Self {
        Self {
            instrumented: String::new(),
            log: ExecutionLog::new(),
            error: Some(message),
        }
    }

    pub(crate) fn execution_failure(instrumented: String, log: ExecutionLog, message: String) -> Self {
        Self {
            instrumented,
            log,
            error: Some(message),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn vars(pairs: &[(&str, serde_json::Value)]) -> Variables {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn sample_log() -> ExecutionLog {
        vec![
            ExecutionLogEntry::new(1, vars(&[]), 10),
            ExecutionLogEntry::new(3, vars(&[("i", json!(0))]), 11),
            ExecutionLogEntry::new(3, vars(&[("i", json!(1))]), 11),
            ExecutionLogEntry::new(2, vars(&[("i", json!(2))]), 12),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_line_states_keep_the_last_entry() {
        let log = sample_log();
        let states = log.line_states();
        assert_eq!(states.len(), 3);
        assert_eq!(states[&3]["i"], json!(1));
        assert_eq!(states.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_entries_for_line_and_first_hit_order() {
        let log = sample_log();
        assert_eq!(log.entries_for_line(3).len(), 2);
        assert!(log.entries_for_line(9).is_empty());
        assert_eq!(log.lines(), vec![1, 3, 2]);
    }

    #[test]
    fn test_wire_format() {
        let result = RunResult::success(
            "let x = 1;".to_string(),
            vec![ExecutionLogEntry::new(1, vars(&[("x", json!(1))]), 5)]
                .into_iter()
                .collect(),
        );
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "instrumented": "let x = 1;",
                "log": [{ "line": 1, "variables": { "x": 1 }, "timestamp": 5 }],
            })
        );

        let failed = RunResult::transform_failure("Unexpected token".to_string());
        let value: serde_json::Value = serde_json::from_str(&failed.to_json().unwrap()).unwrap();
        assert_eq!(value["error"], json!("Unexpected token"));
        assert_eq!(value["log"], json!([]));

        let back: RunResult = serde_json::from_value(value).unwrap();
        assert_eq!(back, failed);
    }

    #[test]
    fn test_variables_keep_declaration_order() {
        let entry = ExecutionLogEntry::new(4, vars(&[("zeta", json!(1)), ("alpha", json!(2))]), 0);
        let text = serde_json::to_string(&entry).unwrap();
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }
}
