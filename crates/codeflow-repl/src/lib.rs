//! Codeflow REPL - Command-line tracer and interactive shell for Codeflow
//!
//! This crate provides the host side of Codeflow: dot-command parsing,
//! multi-line input collection, output notification and the annotated
//! source listing printed after each traced run.

pub mod listing;
pub mod repl;

// Re-export commonly used types for convenience
pub use listing::{render_listing, render_trace};
pub use repl::{DefaultNotifier, Repl, ReplCommand, ReplNotifier};
