//! Codeflow Runtime - High-level interface for tracing program execution
//!
//! Wraps parsing, instrumentation, printing and execution behind one call
//! for use by external components like the REPL or an editor front end.

use std::rc::Rc;
use std::time::Instant;

use swc_core::common::{Globals, GLOBALS};
use tracing::{debug, warn};

use crate::{
    ast::source_gen::print_program,
    evaluator::{EngineOptions, QuickJsEngine, ScriptEngine, Tracker},
    execution_log::RunResult,
    parser::{self, ParseOptions, ParsedProgram, SwcParser, TransformError},
    tracer::{instrument_program, InstrumentStats},
    CodeflowConfig, Result,
};

/// High-level runtime that combines parser, instrumenter and script engine
pub struct CodeflowRuntime {
    config: CodeflowConfig,
    parser: SwcParser,
    engine: Box<dyn ScriptEngine>,
}

impl Default for CodeflowRuntime {
    fn default() -> Self {
        let config = CodeflowConfig::default();
        let engine = Box::new(QuickJsEngine::new(engine_options(&config)));
        Self::build(config, engine)
    }
}

impl CodeflowRuntime {
    /// Create a runtime backed by the embedded QuickJS engine
    pub fn new(config: CodeflowConfig) -> Result<Self> {
        let engine = Box::new(QuickJsEngine::new(engine_options(&config)));
        Self::with_engine(config, engine)
    }

    /// Create a runtime that executes programs with a custom engine
    pub fn with_engine(config: CodeflowConfig, engine: Box<dyn ScriptEngine>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, engine))
    }

    fn build(config: CodeflowConfig, engine: Box<dyn ScriptEngine>) -> Self {
        let parser = SwcParser::new(ParseOptions {
            filename: config.filename.clone(),
            accept_type_annotations: config.accept_type_annotations,
            jsx: config.jsx,
        });
        Self {
            config,
            parser,
            engine,
        }
    }

    pub fn config(&self) -> &CodeflowConfig {
        &self.config
    }

    pub fn parser(&self) -> &SwcParser {
        &self.parser
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Parse, instrument and print `source` without running it
    pub fn instrument(&self, source: &str) -> std::result::Result<String, TransformError> {
        self.instrument_with_stats(source).map(|(code, _)| code)
    }

    /// Like [`instrument`](Self::instrument), also reporting what was inserted
    pub fn instrument_with_stats(
        &self,
        source: &str,
    ) -> std::result::Result<(String, InstrumentStats), TransformError> {
        GLOBALS.set(&Globals::new(), || {
            let ParsedProgram {
                mut program,
                source_map,
            } = self.parser.parse(source)?;

            if self.config.accept_type_annotations {
                parser::strip_type_annotations(&mut program, &source_map)?;
            }

            let stats = instrument_program(
                &mut program,
                &self.config.tracker_name,
                source_map.clone(),
                self.config.line_fallback,
            );
            parser::normalize(&mut program);

            let code = print_program(&program, &source_map)?;
            if code.trim().is_empty() {
                return Err(TransformError::EmptyOutput);
            }
            Ok((code, stats))
        })
    }

    /// Instrument `source`, run it, and collect the execution log.
    ///
    /// A transform failure, including source with no statements, yields empty
    /// code and an empty log. A runtime
    /// failure keeps the code and every entry recorded before the fault.
    pub fn instrument_and_run(&self, source: &str) -> RunResult {
        let tracker = Rc::new(Tracker::new(self.config.mirror_to_log));

        let started = Instant::now();
        let instrumented = match self.instrument_with_stats(source) {
            Ok((code, stats)) => {
                debug!(
                    inserted = stats.inserted(),
                    line_calls = stats.line_calls,
                    var_calls = stats.var_calls,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "instrumented source"
                );
                code
            }
            Err(err) => {
                warn!(error = %err, "transform failed");
                return RunResult::transform_failure(err.to_string());
            }
        };

        let started = Instant::now();
        let outcome = self.engine.execute(&instrumented, &tracker);
        let log = tracker.take_log();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(()) => {
                debug!(engine = self.engine.name(), entries = log.len(), elapsed_ms, "executed program");
                RunResult::success(instrumented, log)
            }
            Err(err) => {
                warn!(error = %err, entries = log.len(), elapsed_ms, "execution failed");
                RunResult::execution_failure(instrumented, log, err.to_string())
            }
        }
    }
}

fn engine_options(config: &CodeflowConfig) -> EngineOptions {
    EngineOptions {
        tracker_name: config.tracker_name.clone(),
        max_value_depth: config.max_value_depth,
        mirror_console: config.mirror_to_log,
    }
}

/// Instrument and run `source` with the default configuration
pub fn instrument_and_run(source: &str) -> RunResult {
    CodeflowRuntime::default().instrument_and_run(source)
}
