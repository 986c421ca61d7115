use std::{
    fs,
    io::{self, IsTerminal, Read},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use codeflow_core::{init_tracing, CodeflowConfig, CodeflowRuntime, LineFallback};
use codeflow_repl::repl::{LineProcessResult, MultiLineCollector, Repl};

fn cli() -> Command {
    Command::new("codeflow-repl")
        .version(codeflow_core::VERSION)
        .about("Trace JavaScript and TypeScript execution line by line")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Trace this file instead of starting the REPL")
                .index(1),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the run result as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show-instrumented")
                .long("show-instrumented")
                .help("Print the instrumented code before the trace")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("instrument-only")
                .long("instrument-only")
                .help("Print the instrumented code without running it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("PATH")
                .help("Write instrumented code here (with --instrument-only)")
                .requires("instrument-only"),
        )
        .arg(
            Arg::new("fallback-counter")
                .long("fallback-counter")
                .help("Number statements without a position from a counter instead of 0")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plain-js")
                .long("plain-js")
                .help("Reject TypeScript syntax")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .value_name("N")
                .help("Nesting depth at which recorded values are cut off")
                .value_parser(clap::value_parser!(usize))
                .default_value("4"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Suppress headers and timing")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    let debug = matches.get_flag("debug");

    if debug {
        init_debug_tracing();
    } else {
        init_tracing();
    }

    let config = config_from(&matches);
    let input_file = matches.get_one::<String>("file").cloned();

    if matches.get_flag("instrument-only") {
        let runtime = CodeflowRuntime::new(config)?;
        let source = read_source(input_file.as_deref())?;
        let code = runtime.instrument(&source)?;
        match matches.get_one::<String>("output") {
            Some(path) => fs::write(path, code).with_context(|| format!("Failed to write {path}"))?,
            None => print!("{code}"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut repl = Repl::with_config(config)?;
    repl.set_debug(debug);
    repl.set_quiet(matches.get_flag("quiet"));
    repl.set_json(matches.get_flag("json"));
    repl.set_show_instrumented(matches.get_flag("show-instrumented"));

    let batch = matches.get_flag("json") || matches.get_flag("quiet");
    if input_file.is_some() || !io::stdin().is_terminal() {
        let source = read_source(input_file.as_deref())?;
        if !batch {
            repl.notifier().on_output(&format!("Original code:\n{source}"));
        }
        let succeeded = repl.trace(&source).is_success();
        return Ok(if succeeded {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    println!(
        "Codeflow REPL v{} ({})",
        codeflow_core::VERSION,
        codeflow_core::features().join(", ")
    );
    println!("Type .help for help, .quit to exit");
    println!();

    run_repl(&mut repl)?;
    Ok(ExitCode::SUCCESS)
}

/// Runtime configuration from the command-line flags
fn config_from(matches: &ArgMatches) -> CodeflowConfig {
    let fallback = if matches.get_flag("fallback-counter") {
        LineFallback::Counter
    } else {
        LineFallback::Zero
    };
    CodeflowConfig::default()
        .with_type_annotations(!matches.get_flag("plain-js"))
        .with_line_fallback(fallback)
        .with_max_value_depth(matches.get_one::<usize>("max-depth").copied().unwrap_or(4))
}

/// Like `init_tracing`, with tracker and console mirroring visible
fn init_debug_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["codeflow_core=debug", "codeflow_repl=debug"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_source(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {path}")),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn run_repl(repl: &mut Repl) -> Result<()> {
    use rustyline::{error::ReadlineError, DefaultEditor};

    let mut rl = DefaultEditor::new()?;
    let mut multiline = MultiLineCollector::new();
    let mut in_eval_mode = false;
    let mut eval_buffer = String::new();

    while repl.is_running() {
        let prompt = if in_eval_mode {
            ".. "
        } else {
            multiline.get_prompt()
        };

        match rl.readline(prompt) {
            Ok(line) => {
                if in_eval_mode {
                    // Accumulate until a single '.' on its own line
                    if line.trim() == "." {
                        rl.add_history_entry(&eval_buffer)?;
                        repl.trace(&eval_buffer);
                        eval_buffer.clear();
                        in_eval_mode = false;
                    } else {
                        if !eval_buffer.is_empty() {
                            eval_buffer.push('\n');
                        }
                        eval_buffer.push_str(&line);
                    }
                    continue;
                }

                let trimmed = line.trim();
                if trimmed.is_empty() && !multiline.is_collecting() {
                    continue;
                }

                if trimmed == ".eval" {
                    in_eval_mode = true;
                    repl.notifier()
                        .on_output("Entering eval mode. End with '.' on a line by itself.");
                    continue;
                }

                if trimmed.starts_with('.') && !multiline.is_collecting() {
                    rl.add_history_entry(&line)?;
                    match repl
                        .parse_input(trimmed)
                        .and_then(|command| repl.handle_command(command))
                    {
                        Ok(output) => repl.notifier().on_output(&output),
                        Err(e) => repl.notifier().on_error(&format!("Error: {e}")),
                    }
                    continue;
                }

                match multiline.process_line(&line, repl.parser()) {
                    LineProcessResult::Complete(code) => {
                        rl.add_history_entry(&code)?;
                        repl.trace(&code);
                    }
                    LineProcessResult::NeedMore => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                if in_eval_mode {
                    println!("^C");
                    eval_buffer.clear();
                    in_eval_mode = false;
                } else if multiline.is_collecting() {
                    println!("^C");
                    multiline.reset();
                } else {
                    println!("Use .quit to exit");
                }
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    repl.show_exit_stats();

    Ok(())
}
