//! REPL (Read-Eval-Print Loop) functionality for Codeflow
//!
//! This module wraps the core runtime with the pieces an interactive tracer
//! needs:
//! - Multi-line input collection
//! - REPL commands (.help, .quit, etc.)
//! - Output formatting and notifications
//! - The annotated listing of the most recent run

use std::{fs, path::Path, time::Instant};

use anyhow::{Context, Result};
use codeflow_core::{CodeflowConfig, CodeflowRuntime, RunResult, SwcParser};
use serde::Serialize;
use tracing::{debug, info};

use crate::listing::{render_listing, render_trace};

pub mod commands;
pub mod multiline;
pub mod notifier;

pub use commands::ReplCommand;
pub use multiline::{LineProcessResult, MultiLineCollector};
pub use notifier::{DefaultNotifier, ReplNotifier};

/// Counters kept across a REPL session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub runs: usize,
    pub failed_runs: usize,
    pub log_entries: usize,
}

/// Interactive tracer for JavaScript and TypeScript snippets
pub struct Repl {
    /// Core Codeflow runtime
    runtime: CodeflowRuntime,
    /// Current notifier for output
    notifier: Box<dyn ReplNotifier>,
    /// Whether the REPL is running
    running: bool,
    /// Quiet mode (suppress timing and section headers)
    quiet: bool,
    /// Debug mode (print every log entry)
    debug: bool,
    /// Print run results as JSON
    json: bool,
    /// Print the instrumented code before the listing
    show_instrumented: bool,
    /// Source and result of the most recent run
    last_run: Option<(String, RunResult)>,
    stats: SessionStats,
}

impl Repl {
    /// Create a new REPL with the given runtime
    pub fn new(runtime: CodeflowRuntime) -> Self {
        Self {
            runtime,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
            quiet: false,
            debug: false,
            json: false,
            show_instrumented: false,
            last_run: None,
            stats: SessionStats::default(),
        }
    }

    /// Create a new REPL from a runtime configuration
    pub fn with_config(config: CodeflowConfig) -> Result<Self> {
        let runtime = CodeflowRuntime::new(config)?;
        Ok(Self::new(runtime))
    }

    /// Set the notifier for this REPL
    pub fn set_notifier(&mut self, notifier: Box<dyn ReplNotifier>) {
        self.notifier = notifier;
    }

    /// Get a reference to the current notifier
    pub fn notifier(&self) -> &dyn ReplNotifier {
        self.notifier.as_ref()
    }

    /// Parser used to decide whether collected input is complete
    pub fn parser(&self) -> &SwcParser {
        self.runtime.parser()
    }

    pub fn runtime(&self) -> &CodeflowRuntime {
        &self.runtime
    }

    /// Check if the REPL is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn set_json(&mut self, json: bool) {
        self.json = json;
    }

    pub fn set_show_instrumented(&mut self, show: bool) {
        self.show_instrumented = show;
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Result of the most recent run, if any
    pub fn last_run(&self) -> Option<&RunResult> {
        self.last_run.as_ref().map(|(_, result)| result)
    }

    /// Parse REPL input into a command
    pub fn parse_input(&self, input: &str) -> Result<ReplCommand> {
        commands::parse_command(input)
    }

    /// Handle a REPL command
    pub fn handle_command(&mut self, command: ReplCommand) -> Result<String> {
        match command {
            ReplCommand::Help => Ok(self.get_help_text()),
            ReplCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            ReplCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                Ok("Screen cleared.".to_string())
            }
            ReplCommand::Quiet => {
                self.quiet = !self.quiet;
                Ok(format!("Quiet mode: {}", on_off(self.quiet)))
            }
            ReplCommand::Debug => {
                self.debug = !self.debug;
                Ok(format!("Debug mode: {}", on_off(self.debug)))
            }
            ReplCommand::Json => {
                self.json = !self.json;
                Ok(format!("JSON output: {}", on_off(self.json)))
            }
            ReplCommand::Instrumented => {
                self.show_instrumented = !self.show_instrumented;
                Ok(format!("Show instrumented code: {}", on_off(self.show_instrumented)))
            }
            ReplCommand::States => match &self.last_run {
                Some((source, result)) => Ok(render_listing(source, &result.log)),
                None => Ok("Nothing traced yet.".to_string()),
            },
            ReplCommand::Load(path) => self.load_file(&path),
            ReplCommand::Stats => self.show_stats(),
        }
    }

    /// Trace a source file, reporting it like any other snippet
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        info!(path = %path.display(), bytes = source.len(), "loading file");

        let result = self.trace(&source);
        Ok(format!("Loaded {} ({})", path.display(), describe_outcome(result)))
    }

    /// Instrument and run `source`, then report the outcome through the
    /// notifier
    pub fn trace(&mut self, source: &str) -> &RunResult {
        let start = Instant::now();
        let result = self.runtime.instrument_and_run(source);
        let duration = start.elapsed().as_millis() as u64;

        self.stats.runs += 1;
        self.stats.log_entries += result.log.len();
        if !result.is_success() {
            self.stats.failed_runs += 1;
        }
        debug!(entries = result.log.len(), duration_ms = duration, "traced snippet");

        self.report(source, &result, duration);
        &self.last_run.insert((source.to_string(), result)).1
    }

    /// Print a run result in the current output mode
    fn report(&self, source: &str, result: &RunResult, duration_ms: u64) {
        if self.json {
            match result.to_json_pretty() {
                Ok(json) => self.notifier.on_output(&json),
                Err(e) => self.notifier.on_error(&format!("Error: {e}")),
            }
            return;
        }

        if self.show_instrumented && !result.instrumented.is_empty() {
            self.section("Instrumented code:", &result.instrumented);
        }
        if !result.instrumented.is_empty() {
            self.section("Execution trace:", &render_listing(source, &result.log));
        }
        if self.debug && !result.log.is_empty() {
            self.section("Log entries:", &render_trace(&result.log));
        }
        if let Some(error) = &result.error {
            self.notifier.on_error(&format!("Error: {error}"));
        }
        self.notifier
            .on_result(&describe_outcome(result), duration_ms, self.quiet);
    }

    fn section(&self, title: &str, body: &str) {
        if self.quiet {
            self.notifier.on_output(body);
        } else {
            self.notifier.on_output(&format!("{title}\n{body}"));
        }
    }

    /// Get help text
    fn get_help_text(&self) -> String {
        r#"Codeflow REPL Commands:
  .help          - Show this help message
  .quit          - Exit the REPL
  .clear         - Clear the screen
  .quiet         - Toggle quiet mode (hide timing info and headers)
  .debug         - Toggle debug mode (print every log entry)
  .json          - Toggle printing results as JSON
  .instrumented  - Toggle showing the instrumented code
  .states        - Show the annotated listing of the last run
  .load <file>   - Trace a JavaScript or TypeScript file
  .stats         - Show session statistics
  .eval          - Enter multi-line evaluation mode (end with '.')

Each snippet is instrumented and run on its own; nothing carries over
between snippets. Lines marked ● recorded state, ○ did not."#
            .to_string()
    }

    /// Show session statistics
    fn show_stats(&self) -> Result<String> {
        if self.json {
            return Ok(serde_json::to_string_pretty(&self.stats)?);
        }
        let config = self.runtime.config();
        Ok(format!(
            "Session Statistics:\n  Runs: {}\n  Failed runs: {}\n  Log entries: {}\n  Parser: {}\n  Engine: {}\n  Tracker: {}\n  Debug mode: {}\n  Quiet mode: {}",
            self.stats.runs,
            self.stats.failed_runs,
            self.stats.log_entries,
            self.runtime.parser().name(),
            self.runtime.engine_name(),
            config.tracker_name,
            self.debug,
            self.quiet
        ))
    }

    /// Show exit statistics
    pub fn show_exit_stats(&self) {
        if !self.quiet {
            println!("\nSession complete: {} runs.", self.stats.runs);
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

fn describe_outcome(result: &RunResult) -> String {
    let lines = result.log.lines().len();
    let entries = result.log.len();
    let status = if result.is_success() { "ok" } else { "failed" };
    format!("{status}, {entries} entries over {lines} lines")
}
