/*!
# Instrumentation Integration Tests

Shape of the instrumented source produced by the runtime, without running it.
*/

use codeflow_core::parser::{ParseOptions, SwcParser};
use codeflow_core::{CodeflowConfig, CodeflowRuntime, LineFallback, TransformError};

const SIMPLE_VARIABLES: &str = include_str!("fixtures/simple_variables.js");
const TYPED_USER: &str = include_str!("fixtures/typed_user.ts");
const CONTROL_FLOW: &str = include_str!("fixtures/control_flow.js");

fn plain_js() -> SwcParser {
    SwcParser::new(ParseOptions {
        accept_type_annotations: false,
        ..Default::default()
    })
}

fn normalized(code: &str) -> String {
    code.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_instrumented_fixtures_are_valid_javascript() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::default();
    for source in [SIMPLE_VARIABLES, TYPED_USER, CONTROL_FLOW] {
        let code = runtime.instrument(source)?;
        assert!(!code.trim().is_empty());
        assert!(plain_js().accepts(&code), "not valid JavaScript:\n{code}");
    }
    Ok(())
}

#[test]
fn test_simple_variables_shape() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::default();
    let (code, stats) = runtime.instrument_with_stats(SIMPLE_VARIABLES)?;
    let code = normalized(&code);

    // three declarations; the console call is a bare expression
    assert_eq!(stats.line_calls, 3);
    assert_eq!(stats.var_calls, 3);
    assert_eq!(code.matches("__debugTracker.trackLine(").count(), 3);
    assert!(code.contains("__debugTracker.trackLine(1, {})"));
    assert!(code.contains(r#"__debugTracker.trackVar("sum", sum, 3)"#));
    assert!(code.contains(r#"y: typeof y !== "undefined" ? y : "undefined""#));
    Ok(())
}

#[test]
fn test_type_annotations_are_stripped() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::default();
    let (code, stats) = runtime.instrument_with_stats(TYPED_USER)?;

    assert!(!code.contains("interface"));
    assert!(!code.contains(": string"));
    assert!(!code.contains(": User"));
    // the interface produces no tracking call
    assert_eq!(stats.line_calls, 2);
    assert!(code.contains("trackLine(6,"));
    assert!(code.contains("trackLine(7,"));
    assert!(!code.contains("trackLine(1,"));
    Ok(())
}

#[test]
fn test_type_annotations_rejected_in_plain_mode() {
    let config = CodeflowConfig::default().with_type_annotations(false);
    let runtime = CodeflowRuntime::new(config).unwrap();
    let err = runtime.instrument(TYPED_USER).unwrap_err();
    assert!(matches!(err, TransformError::Parse { line: 1, .. }), "{err:?}");
}

#[test]
fn test_function_bodies_see_earlier_declarations() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::default();
    let (code, stats) = runtime.instrument_with_stats(CONTROL_FLOW)?;
    let code = normalized(&code);

    // function, let total, return, three lets, if
    assert_eq!(stats.line_calls, 7);
    assert_eq!(stats.declared, 4);
    let return_line = code.find("trackLine(3,").unwrap();
    let return_stmt = code.find("return total").unwrap();
    assert!(code[return_line..return_stmt].contains("total: typeof total"));

    let if_line = code.find("trackLine(10,").unwrap();
    let if_stmt = code.find("if (finalPrice > 100)").unwrap();
    let snapshot = &code[if_line..if_stmt];
    for name in ["total", "price", "taxRate", "finalPrice"] {
        assert!(snapshot.contains(&format!("{name}: typeof {name}")), "{name} missing");
    }
    Ok(())
}

#[test]
fn test_synthetic_calls_use_configured_name() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::new(CodeflowConfig::default().with_tracker_name("__tracer"))?;
    let code = runtime.instrument(SIMPLE_VARIABLES)?;
    assert!(code.contains("__tracer.trackLine("));
    assert!(code.contains("__tracer.trackVar("));
    Ok(())
}

#[test]
fn test_every_statement_kind_stays_valid() -> anyhow::Result<()> {
    let runtime = CodeflowRuntime::new(CodeflowConfig::default().with_line_fallback(LineFallback::Counter))?;
    let source = r#"
class Counter {
  constructor() { this.count = 0; }
  increment() { this.count++; return this.count; }
}
const counter = new Counter();
outer: for (const item of [1, 2, 3]) {
  for (const key in { a: 1 }) {
    if (item === 2) continue outer;
    else if (item === 3) break outer;
  }
}
let n = 0;
while (n < 2) n++;
do n--; while (n > 0);
switch (n) {
  case 0: { const zero = true; break; }
  default: n = 1;
}
try { throw new Error("x"); } catch (err) { const message = err.message; } finally { n = 2; }
const arrow = (v) => { const doubled = v * 2; return doubled; };
"#;
    let code = runtime.instrument(source)?;
    assert!(plain_js().accepts(&code), "not valid JavaScript:\n{code}");
    assert!(code.contains(r#"trackVar("doubled""#));
    assert!(code.contains(r#"trackVar("message""#));
    assert!(!code.contains(r#"trackVar("item""#));
    assert!(!code.contains(r#"trackVar("key""#));
    Ok(())
}

#[test]
fn test_parse_errors_carry_position() {
    let runtime = CodeflowRuntime::default();
    let err = runtime.instrument("let a = 1;\nlet b = (2;\n").unwrap_err();
    match err {
        TransformError::Parse { line, column, .. } => {
            assert_eq!(line, 2);
            assert!(column > 0);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}
