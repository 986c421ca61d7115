// Parser module - swc-backed JavaScript / TypeScript front end
use std::fmt;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use swc_core::common::errors::{Handler, HANDLER};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Program};
use swc_core::ecma::parser::error::Error as ParserError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::fixer::fixer;
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::transforms::typescript::strip;
use thiserror::Error;
use tracing::debug;

/// Errors raised before the instrumented program gets to run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("{message} ({line}:{column})")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Type stripping failed: {0}")]
    Strip(String),

    #[error("Code generation failed: {0}")]
    Print(String),

    /// Nothing executable was left after the transform
    #[error("Failed to transform code")]
    EmptyOutput,
}

impl TransformError {
    pub fn parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::Parse {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Options controlling which syntax the parser accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub filename: String,
    pub accept_type_annotations: bool,
    pub jsx: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: "user-code.ts".to_string(),
            accept_type_annotations: true,
            jsx: false,
        }
    }
}

/// A parsed program together with the source map its spans point into
pub struct ParsedProgram {
    pub program: Program,
    pub source_map: Lrc<SourceMap>,
}

impl fmt::Debug for ParsedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedProgram")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

/// Parser for the traced language
#[derive(Debug, Clone, Default)]
pub struct SwcParser {
    options: ParseOptions,
}

impl SwcParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Get parser name for debugging
    pub fn name(&self) -> &'static str {
        if self.options.accept_type_annotations {
            "swc-typescript"
        } else {
            "swc-ecmascript"
        }
    }

    fn syntax(&self) -> Syntax {
        if self.options.accept_type_annotations {
            Syntax::Typescript(TsSyntax {
                tsx: self.options.jsx,
                decorators: true,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.options.jsx,
                ..Default::default()
            })
        }
    }

    /// Parse source text into a program tree with line/column positions
    ///
    /// Errors the parser recovers from are reported as failures too.
    pub fn parse(&self, source: &str) -> Result<ParsedProgram, TransformError> {
        if GLOBALS.is_set() {
            self.parse_source(source)
        } else {
            GLOBALS.set(&Globals::new(), || self.parse_source(source))
        }
    }

    /// True when `source` parses cleanly
    pub fn accepts(&self, source: &str) -> bool {
        self.parse(source).is_ok()
    }

    fn parse_source(&self, source: &str) -> Result<ParsedProgram, TransformError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let file = source_map.new_source_file(
            FileName::Custom(self.options.filename.clone()).into(),
            source.to_string(),
        );
        let lexer = Lexer::new(
            self.syntax(),
            EsVersion::latest(),
            StringInput::from(&*file),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let program = parser
            .parse_program()
            .map_err(|e| parse_error(&source_map, e))?;
        if let Some(recovered) = parser.take_errors().into_iter().next() {
            return Err(parse_error(&source_map, recovered));
        }

        debug!(parser = self.name(), bytes = source.len(), "parsed program");
        Ok(ParsedProgram {
            program,
            source_map,
        })
    }
}

fn parse_error(source_map: &SourceMap, error: ParserError) -> TransformError {
    let message = error.kind().msg().to_string();
    let span = error.span();
    if span.is_dummy() {
        return TransformError::parse(message, 0, 0);
    }
    let loc = source_map.lookup_char_pos(span.lo);
    TransformError::parse(message, loc.line, loc.col.0 + 1)
}

/// Collects diagnostics written by the swc error handler
#[derive(Clone, Default)]
struct DiagnosticBuffer(Arc<Mutex<Vec<u8>>>);

impl DiagnosticBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).trim().to_string()
    }
}

impl io::Write for DiagnosticBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Remove type-only syntax (interfaces, aliases, annotations, assertions)
///
/// Must run inside `GLOBALS.set`, since scope resolution allocates marks.
pub fn strip_type_annotations(
    program: &mut Program,
    source_map: &Lrc<SourceMap>,
) -> Result<(), TransformError> {
    let diagnostics = DiagnosticBuffer::default();
    let handler = Handler::with_emitter_writer(
        Box::new(diagnostics.clone()),
        Some(source_map.clone()),
    );

    HANDLER.set(&handler, || {
        let unresolved_mark = Mark::new();
        let top_level_mark = Mark::new();
        program.mutate(resolver(unresolved_mark, top_level_mark, true));
        program.mutate(strip(unresolved_mark, top_level_mark));
    });

    if handler.has_errors() {
        return Err(TransformError::Strip(diagnostics.contents()));
    }
    Ok(())
}

/// Insert the parentheses the printer needs after the tree was rewritten
pub fn normalize(program: &mut Program) {
    program.mutate(fixer(None));
}
