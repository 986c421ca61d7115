//! # Codeflow Core
//!
//! Line-level execution tracing for JavaScript and TypeScript programs:
//! - Source parsing and printing (TypeScript annotations are stripped)
//! - A transform pass that injects tracking calls before traceable statements
//! - A runtime tracker that records an execution log while the program runs
//! - An embedded script engine that executes the instrumented program
//!
//! The [`runtime::CodeflowRuntime`] ties these together and is the only entry
//! point a host (REPL, editor, test harness) needs.

#![warn(clippy::all)]

pub mod ast;
pub mod evaluator;
pub mod execution_log;
pub mod parser;
pub mod runtime;
pub mod tracer;

// Re-export commonly used types
pub use evaluator::{EvaluatorError, QuickJsEngine, ScriptEngine, Tracker};
pub use execution_log::{ExecutionLog, ExecutionLogEntry, RunResult, Variables};
pub use parser::{SwcParser, TransformError};
pub use runtime::{instrument_and_run, CodeflowRuntime};
pub use tracer::{InstrumentStats, Instrumenter, LineFallback};

/// Codeflow version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Global name the injected tracking calls resolve the tracker through
pub const DEFAULT_TRACKER_NAME: &str = "__debugTracker";

/// Value reported for a variable that is in scope but not yet initialized
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Source languages accepted by this build
pub fn features() -> Vec<&'static str> {
    vec!["javascript", "typescript", "quickjs"]
}

/// Initialize tracing for Codeflow components
///
/// Events go to stderr so machine-readable output on stdout stays clean.
pub fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "codeflow_core=info".parse() {
        filter = filter.add_directive(directive);
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Core Codeflow configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CodeflowConfig {
    /// Global name of the tracker object seen by instrumented code
    pub tracker_name: String,
    /// Virtual file name used in parse diagnostics
    pub filename: String,
    /// Parse TypeScript syntax and strip annotations before instrumenting
    pub accept_type_annotations: bool,
    /// Accept JSX / TSX syntax
    pub jsx: bool,
    /// Line reported for nodes without a source position
    pub line_fallback: LineFallback,
    /// Nesting depth at which value snapshots stop descending
    pub max_value_depth: usize,
    /// Mirror tracker and console calls to the tracing sink
    pub mirror_to_log: bool,
}

impl Default for CodeflowConfig {
    fn default() -> Self {
        Self {
            tracker_name: DEFAULT_TRACKER_NAME.to_string(),
            filename: "user-code.ts".to_string(),
            accept_type_annotations: true,
            jsx: false,
            line_fallback: LineFallback::Zero,
            max_value_depth: 4,
            mirror_to_log: true,
        }
    }
}

impl CodeflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracker_name(mut self, name: impl Into<String>) -> Self {
        self.tracker_name = name.into();
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_type_annotations(mut self, accept: bool) -> Self {
        self.accept_type_annotations = accept;
        self
    }

    pub fn with_jsx(mut self, jsx: bool) -> Self {
        self.jsx = jsx;
        self
    }

    pub fn with_line_fallback(mut self, fallback: LineFallback) -> Self {
        self.line_fallback = fallback;
        self
    }

    pub fn with_max_value_depth(mut self, depth: usize) -> Self {
        self.max_value_depth = depth;
        self
    }

    pub fn with_mirror_to_log(mut self, mirror: bool) -> Self {
        self.mirror_to_log = mirror;
        self
    }

    /// Check the configuration before a runtime is built from it
    pub fn validate(&self) -> Result<()> {
        if !is_plain_identifier(&self.tracker_name) {
            return Err(CodeflowError::Config(format!(
                "tracker name '{}' is not a plain JavaScript identifier",
                self.tracker_name
            )));
        }
        if self.max_value_depth == 0 {
            return Err(CodeflowError::Config(
                "max_value_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Error types for Codeflow core operations
#[derive(thiserror::Error, Debug)]
pub enum CodeflowError {
    /// Parsing, stripping or printing failed
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// The instrumented program raised, or the engine could not be set up
    #[error("Execution error: {0}")]
    Execution(#[from] EvaluatorError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for Codeflow core operations
pub type Result<T> = std::result::Result<T, CodeflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CodeflowConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tracker_name, "__debugTracker");
        assert_eq!(config.line_fallback, LineFallback::Zero);
    }

    #[test]
    fn rejects_tracker_names_that_are_not_identifiers() {
        for name in ["", "1tracker", "debug.tracker", "my tracker", "a-b"] {
            let config = CodeflowConfig::new().with_tracker_name(name);
            assert!(
                matches!(config.validate(), Err(CodeflowError::Config(_))),
                "accepted {name:?}"
            );
        }
        let config = CodeflowConfig::new().with_tracker_name("$trace_1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_snapshot_depth() {
        let config = CodeflowConfig::new().with_max_value_depth(0);
        assert!(matches!(config.validate(), Err(CodeflowError::Config(_))));
    }
}
