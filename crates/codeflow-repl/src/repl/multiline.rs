//! Multi-line input collection for the REPL
//!
//! Handles collection of multi-line JavaScript and TypeScript snippets:
//! - Bracket/brace matching
//! - String and template literal handling
//! - Line and block comments
//! - Statement completion detection through the parser

use codeflow_core::SwcParser;

/// Result of processing a line of input
#[derive(Debug, PartialEq, Eq)]
pub enum LineProcessResult {
    /// Input is complete and ready for execution
    Complete(String),
    /// More input is needed to complete the statement
    NeedMore,
}

/// Collects multi-line input for complete statements
pub struct MultiLineCollector {
    /// Buffer for collecting lines
    buffer: String,
    /// Current nesting level (for braces, brackets, etc.)
    nesting_level: i32,
    /// Open string delimiter, if any (`'`, `"` or a backtick)
    string_delimiter: Option<char>,
    /// Whether the last character was an escape
    last_was_escape: bool,
    /// Whether we're inside a `/* */` comment
    in_block_comment: bool,
}

impl MultiLineCollector {
    /// Create a new multi-line collector
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            nesting_level: 0,
            string_delimiter: None,
            last_was_escape: false,
            in_block_comment: false,
        }
    }

    /// Get the appropriate prompt for the current state
    pub fn get_prompt(&self) -> &'static str {
        if self.is_collecting() {
            ".. " // Continuation prompt
        } else {
            ">> " // Main prompt
        }
    }

    /// Check if we're currently collecting a multi-line statement
    pub fn is_collecting(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Reset the collector state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.nesting_level = 0;
        self.string_delimiter = None;
        self.last_was_escape = false;
        self.in_block_comment = false;
    }

    /// Process a line of input
    pub fn process_line(&mut self, line: &str, parser: &SwcParser) -> LineProcessResult {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(line);

        self.update_parsing_state(line);

        if self.is_complete_statement(parser) {
            let complete_code = std::mem::take(&mut self.buffer);
            self.reset();
            LineProcessResult::Complete(complete_code)
        } else {
            LineProcessResult::NeedMore
        }
    }

    /// Update parsing state based on the new line
    fn update_parsing_state(&mut self, line: &str) {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if self.in_block_comment {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    self.in_block_comment = false;
                }
                continue;
            }

            if let Some(delimiter) = self.string_delimiter {
                if self.last_was_escape {
                    self.last_was_escape = false;
                } else if ch == '\\' {
                    self.last_was_escape = true;
                } else if ch == delimiter {
                    self.string_delimiter = None;
                }
                continue;
            }

            match ch {
                '"' | '\'' | '`' => {
                    self.string_delimiter = Some(ch);
                    self.last_was_escape = false;
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    self.in_block_comment = true;
                }
                '{' | '(' | '[' => self.nesting_level += 1,
                '}' | ')' | ']' => self.nesting_level -= 1,
                _ => {}
            }
        }

        // Only template literals span lines
        if matches!(self.string_delimiter, Some('"') | Some('\'')) {
            self.string_delimiter = None;
            self.last_was_escape = false;
        }
    }

    /// Check if the current buffer contains a complete statement
    fn is_complete_statement(&self, parser: &SwcParser) -> bool {
        if self.string_delimiter.is_some() || self.in_block_comment || self.nesting_level > 0 {
            return false;
        }

        if parser.accepts(&self.buffer) {
            return true;
        }

        // Balanced but unparseable: wait only when the input is plainly
        // unfinished, otherwise hand it over so the error gets reported
        let trimmed = self.buffer.trim_end();
        let continues = [",", "=", "=>", "+", "-", "*", "&&", "||", "?", ":", "."]
            .iter()
            .any(|suffix| trimmed.ends_with(suffix));
        let open_keyword = ["if", "else", "for", "while", "do", "function", "let", "const", "var", "return"]
            .iter()
            .any(|keyword| trimmed.split_whitespace().last() == Some(*keyword));
        !(continues || open_keyword)
    }
}

impl Default for MultiLineCollector {
    fn default() -> Self {
        Self::new()
    }
}
