//! Output notification system for the REPL
//!
//! Provides a trait-based system for handling REPL output, so the console
//! can be swapped for another sink (a test buffer, a file).

/// Trait for handling REPL output notifications
pub trait ReplNotifier: Send + Sync {
    /// Handle regular output
    fn on_output(&self, content: &str);

    /// Handle error output
    fn on_error(&self, content: &str);

    /// Handle the one-line summary of a traced run
    fn on_result(&self, summary: &str, duration_ms: u64, quiet: bool);
}

/// Default console-based notifier
pub struct DefaultNotifier;

impl DefaultNotifier {
    /// Create a new default notifier
    pub fn new() -> Self {
        Self
    }
}

impl ReplNotifier for DefaultNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{}", content.trim_end_matches('\n'));
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{}", content);
    }

    fn on_result(&self, summary: &str, duration_ms: u64, quiet: bool) {
        if quiet {
            println!("{}", summary);
        } else {
            println!("=> {} ({}ms)", summary, duration_ms);
        }
    }
}

impl Default for DefaultNotifier {
    fn default() -> Self {
        Self::new()
    }
}
