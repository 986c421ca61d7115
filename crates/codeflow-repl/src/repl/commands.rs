//! REPL command parsing and definitions
//!
//! Handles parsing of dot-commands (.help, .quit, etc.). The `.eval`
//! multi-line mode is driven by the input loop and never reaches here.

use anyhow::{anyhow, Result};

/// Available REPL commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Show help information
    Help,
    /// Exit the REPL
    Quit,
    /// Clear the screen
    Clear,
    /// Toggle quiet mode
    Quiet,
    /// Toggle debug mode
    Debug,
    /// Toggle printing run results as JSON
    Json,
    /// Toggle showing the instrumented code
    Instrumented,
    /// Re-print the listing of the last run
    States,
    /// Trace a file from disk
    Load(String),
    /// Show session statistics
    Stats,
}

/// Parse a command string into a ReplCommand
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let trimmed = input.trim();

    let Some(body) = trimmed.strip_prefix('.') else {
        return Err(anyhow!("Commands must start with '.'"));
    };

    let parts: Vec<&str> = body.split_whitespace().collect();
    let Some(name) = parts.first() else {
        return Err(anyhow!("Empty command"));
    };

    match *name {
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        "clear" | "cls" => Ok(ReplCommand::Clear),
        "quiet" => Ok(ReplCommand::Quiet),
        "debug" => Ok(ReplCommand::Debug),
        "json" => Ok(ReplCommand::Json),
        "instrumented" | "inst" => Ok(ReplCommand::Instrumented),
        "states" | "listing" => Ok(ReplCommand::States),
        "stats" | "statistics" => Ok(ReplCommand::Stats),
        "load" => {
            if parts.len() != 2 {
                return Err(anyhow!("Usage: .load <file>"));
            }
            Ok(ReplCommand::Load(parts[1].to_string()))
        }
        _ => Err(anyhow!("Unknown command: .{}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_help() {
        assert_eq!(parse_command(".help").unwrap(), ReplCommand::Help);
        assert_eq!(parse_command(".h").unwrap(), ReplCommand::Help);
    }

    #[test]
    fn test_parse_quit() {
        assert_eq!(parse_command(".quit").unwrap(), ReplCommand::Quit);
        assert_eq!(parse_command(".q").unwrap(), ReplCommand::Quit);
        assert_eq!(parse_command("  .exit  ").unwrap(), ReplCommand::Quit);
    }

    #[test]
    fn test_parse_toggles() {
        assert_eq!(parse_command(".json").unwrap(), ReplCommand::Json);
        assert_eq!(parse_command(".instrumented").unwrap(), ReplCommand::Instrumented);
        assert_eq!(parse_command(".states").unwrap(), ReplCommand::States);
    }

    #[test]
    fn test_parse_load() {
        match parse_command(".load demos/loop.js").unwrap() {
            ReplCommand::Load(path) => assert_eq!(path, "demos/loop.js"),
            other => panic!("Expected Load command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_invalid_command() {
        assert!(parse_command(".invalid").is_err());
        assert!(parse_command("help").is_err()); // Missing dot
        assert!(parse_command(".").is_err());
        assert!(parse_command(".load").is_err()); // Missing argument
    }
}
