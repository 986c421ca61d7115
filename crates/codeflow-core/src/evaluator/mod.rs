// Execution of instrumented programs
use std::rc::Rc;

use rquickjs::{CatchResultExt, Context, Runtime};
use tracing::debug;

pub mod bindings;
pub mod errors;
pub mod tracker;
pub mod values;

pub use errors::EvaluatorError;
pub use tracker::Tracker;
pub use values::Snapshotter;

/// Something that can run a printed program with a tracker in scope
pub trait ScriptEngine {
    /// Run `code` to completion.
    ///
    /// The tracker must be reachable from the program under its global name
    /// for the whole run. Entries it collected stay in it even when the
    /// program throws.
    fn execute(&self, code: &str, tracker: &Rc<Tracker>) -> Result<(), EvaluatorError>;

    /// Get engine name for debugging
    fn name(&self) -> &'static str;
}

/// Settings the QuickJS engine needs from the runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub tracker_name: String,
    pub max_value_depth: usize,
    pub mirror_console: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            tracker_name: crate::DEFAULT_TRACKER_NAME.to_string(),
            max_value_depth: 4,
            mirror_console: true,
        }
    }
}

/// Embedded QuickJS interpreter.
///
/// Every call gets a fresh runtime and context, so no global state leaks from
/// one run into the next. The program is evaluated as a classic script;
/// pending promise jobs are not drained.
#[derive(Debug, Clone, Default)]
pub struct QuickJsEngine {
    options: EngineOptions,
}

impl QuickJsEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }
}

impl ScriptEngine for QuickJsEngine {
    fn execute(&self, code: &str, tracker: &Rc<Tracker>) -> Result<(), EvaluatorError> {
        let runtime =
            Runtime::new().map_err(|e| EvaluatorError::engine("failed to create runtime", e))?;
        let context = Context::full(&runtime)
            .map_err(|e| EvaluatorError::engine("failed to create context", e))?;

        context.with(|ctx| {
            let snapshotter = Snapshotter::new(&ctx, self.options.max_value_depth);
            bindings::install_console(&ctx, self.options.mirror_console, snapshotter)
                .map_err(|e| EvaluatorError::engine("failed to install console", e))?;
            bindings::install_tracker(&ctx, &self.options.tracker_name, tracker.clone(), snapshotter)
                .map_err(|e| EvaluatorError::engine("failed to install tracker", e))?;

            debug!(bytes = code.len(), "evaluating instrumented program");
            ctx.eval::<(), _>(code)
                .catch(&ctx)
                .map_err(|caught| EvaluatorError::from_caught(caught, &snapshotter))
        })
    }

    fn name(&self) -> &'static str {
        "quickjs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> (Result<(), EvaluatorError>, Rc<Tracker>) {
        let tracker = Rc::new(Tracker::new(false));
        let result = QuickJsEngine::default().execute(code, &tracker);
        (result, tracker)
    }

    #[test]
    fn test_execute_collects_tracker_calls() {
        let (result, tracker) = run("for (let i = 0; i < 3; i++) { __debugTracker.trackLine(7, { i }); }");
        assert!(result.is_ok());
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_thrown_errors_keep_partial_log() {
        let (result, tracker) = run("__debugTracker.trackLine(1, {}); missing.call();");
        match result {
            Err(EvaluatorError::Thrown { name, message, .. }) => {
                assert_eq!(name.as_deref(), Some("ReferenceError"));
                assert!(message.contains("missing"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_thrown_non_error_values() {
        let (result, _) = run("throw 'boom';");
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_runs_are_isolated() {
        let (first, _) = run("var leaked = 1;");
        assert!(first.is_ok());
        let (second, _) = run("if (typeof leaked !== 'undefined') throw new Error('leak');");
        assert!(second.is_ok());
    }

    #[test]
    fn test_custom_tracker_name() {
        let engine = QuickJsEngine::new(EngineOptions {
            tracker_name: "tracer".to_string(),
            ..Default::default()
        });
        let tracker = Rc::new(Tracker::new(false));
        engine.execute("tracer.trackLine(2, {});", &tracker).unwrap();
        assert_eq!(tracker.len(), 1);
        assert_eq!(engine.name(), "quickjs");
    }
}
