// Source code generation from the program tree
// Comments are not carried through; the printed text is meant to be run, not read back.

use swc_core::common::sync::Lrc;
use swc_core::common::SourceMap;
use swc_core::ecma::ast::{EsVersion, Program};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config, Emitter};

use crate::parser::TransformError;

/// Print a program tree back to JavaScript text
pub fn print_program(
    program: &Program,
    source_map: &Lrc<SourceMap>,
) -> Result<String, TransformError> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(source_map.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: Config::default().with_target(EsVersion::latest()),
            cm: source_map.clone(),
            comments: None,
            wr: writer,
        };
        emitter
            .emit_program(program)
            .map_err(|e| TransformError::Print(e.to_string()))?;
    }
    String::from_utf8(buf).map_err(|e| TransformError::Print(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SwcParser;

    #[test]
    fn test_print_round_trips_statements() {
        let parsed = SwcParser::default()
            .parse("let x = 5;\nif (x > 1) { x = 2; }")
            .unwrap();
        let code = print_program(&parsed.program, &parsed.source_map).unwrap();
        assert!(code.contains("let x = 5;"));
        assert!(code.contains("if (x > 1)"));
        assert!(SwcParser::default().accepts(&code));
    }

    #[test]
    fn test_print_empty_program() {
        let parsed = SwcParser::default().parse("").unwrap();
        let code = print_program(&parsed.program, &parsed.source_map).unwrap();
        assert!(code.trim().is_empty());
    }
}
