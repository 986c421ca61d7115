//! Host objects installed into the script context before the program runs.

use std::rc::Rc;

use rquickjs::function::{Opt, Rest};
use rquickjs::{Ctx, Function, Object, Value};
use tracing::{debug, error, info, warn};

use super::tracker::Tracker;
use super::values::{self, Snapshotter};
use crate::ast::{TRACK_LINE, TRACK_VAR};

/// Bind the tracker under `name` as `{ trackLine, trackVar }`.
///
/// Both functions accept any arguments and never throw. A call arriving while
/// another is still snapshotting is ignored.
pub fn install_tracker<'js>(
    ctx: &Ctx<'js>,
    name: &str,
    tracker: Rc<Tracker>,
    snapshotter: Snapshotter,
) -> rquickjs::Result<()> {
    let object = Object::new(ctx.clone())?;

    let line_tracker = tracker.clone();
    let track_line = Function::new(
        ctx.clone(),
        move |line: Opt<Value<'js>>, variables: Opt<Value<'js>>| {
            let Some(_recording) = line_tracker.begin() else {
                return;
            };
            let line = line.0.as_ref().map(values::line_number).unwrap_or(0);
            let variables = variables
                .0
                .as_ref()
                .map(|variables| snapshotter.variables(variables))
                .unwrap_or_default();
            line_tracker.track_line(line, variables);
        },
    )?;
    object.set(TRACK_LINE, track_line)?;

    let track_var = Function::new(
        ctx.clone(),
        move |name: Opt<Value<'js>>, value: Opt<Value<'js>>, line: Opt<Value<'js>>| {
            if !tracker.mirrors() {
                return;
            }
            let Some(_recording) = tracker.begin() else {
                return;
            };
            let name = name
                .0
                .as_ref()
                .map(|name| snapshotter.describe(name))
                .unwrap_or_default();
            let value = value
                .0
                .as_ref()
                .map(|value| snapshotter.snapshot(value))
                .unwrap_or_else(|| serde_json::Value::String(crate::UNDEFINED_SENTINEL.to_string()));
            let line = line.0.as_ref().map(values::line_number).unwrap_or(0);
            tracker.track_var(&name, &value, line);
        },
    )?;
    object.set(TRACK_VAR, track_var)?;

    ctx.globals().set(name, object)?;
    Ok(())
}

/// Severity a console method reports at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Log,
    Info,
    Debug,
    Warn,
    Error,
}

impl ConsoleLevel {
    pub const ALL: [ConsoleLevel; 5] = [
        ConsoleLevel::Log,
        ConsoleLevel::Info,
        ConsoleLevel::Debug,
        ConsoleLevel::Warn,
        ConsoleLevel::Error,
    ];

    pub fn method(self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Debug => "debug",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
        }
    }

    fn emit(self, message: &str) {
        match self {
            ConsoleLevel::Log | ConsoleLevel::Info => {
                info!(target: "codeflow_core::console", "{}", message)
            }
            ConsoleLevel::Debug => debug!(target: "codeflow_core::console", "{}", message),
            ConsoleLevel::Warn => warn!(target: "codeflow_core::console", "{}", message),
            ConsoleLevel::Error => error!(target: "codeflow_core::console", "{}", message),
        }
    }
}

/// Space-joined rendering of console arguments
pub fn format_console_args(args: &[Value<'_>], snapshotter: &Snapshotter) -> String {
    args.iter()
        .map(|arg| snapshotter.describe(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bind a `console` whose methods forward to the tracing sink.
///
/// With `mirror` off the methods exist but discard their arguments.
pub fn install_console<'js>(
    ctx: &Ctx<'js>,
    mirror: bool,
    snapshotter: Snapshotter,
) -> rquickjs::Result<()> {
    let console = Object::new(ctx.clone())?;
    for level in ConsoleLevel::ALL {
        let method = Function::new(ctx.clone(), move |args: Rest<Value<'js>>| {
            if mirror {
                level.emit(&format_console_args(&args.0, &snapshotter));
            }
        })?;
        console.set(level.method(), method)?;
    }
    ctx.globals().set("console", console)?;
    Ok(())
}
