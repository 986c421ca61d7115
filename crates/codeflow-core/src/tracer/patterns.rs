/*!
# Statement Shape Matching

Predicates over swc statements used by the instrumenter to decide where
tracking calls go.
*/

use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{Pat, Stmt};

/// A statement gets a line-tracking call unless it is a bare block or a
/// bare expression statement.
pub fn is_traceable(stmt: &Stmt) -> bool {
    !matches!(stmt, Stmt::Block(_) | Stmt::Expr(_))
}

/// The name a declarator binds, when its target is a plain identifier.
///
/// Destructuring targets yield `None` and are left alone.
pub fn simple_binding_name(pat: &Pat) -> Option<&str> {
    match pat {
        Pat::Ident(binding) => Some(binding.id.sym.as_ref()),
        _ => None,
    }
}

/// Spans of the traceable statements a label chain wraps, outermost first.
///
/// `outer: inner: for (...) {}` yields the `inner` and `for` spans. The
/// labeled statement itself is not included.
pub fn labeled_body_spans(stmt: &Stmt) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut current = stmt;
    while let Stmt::Labeled(labeled) = current {
        current = &labeled.body;
        if is_traceable(current) {
            spans.push(current.span());
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SwcParser;
    use swc_core::ecma::ast::{Decl, ModuleItem, Program};

    fn first_stmt(source: &str) -> Stmt {
        let parsed = SwcParser::default().parse(source).unwrap();
        match parsed.program {
            Program::Script(mut script) => script.body.remove(0),
            Program::Module(mut module) => match module.body.remove(0) {
                ModuleItem::Stmt(stmt) => stmt,
                ModuleItem::ModuleDecl(decl) => panic!("unexpected module decl: {decl:?}"),
            },
        }
    }

    #[test]
    fn test_blocks_and_expressions_are_not_traceable() {
        assert!(!is_traceable(&first_stmt("{ let a = 1; }")));
        assert!(!is_traceable(&first_stmt("foo();")));
        assert!(!is_traceable(&first_stmt("x = 1;")));
    }

    #[test]
    fn test_declarations_and_control_flow_are_traceable() {
        for source in [
            "let a = 1;",
            "function f() {}",
            "class A {}",
            "if (a) {}",
            "for (;;) {}",
            "while (false) {}",
            "return;",
            "throw e;",
            "try {} catch {}",
            "l: for (;;) {}",
            ";",
        ] {
            let parsed = SwcParser::default().parse(source);
            // `return` outside a function is rejected by the parser; skip those
            let Ok(parsed) = parsed else { continue };
            let stmt = match parsed.program {
                Program::Script(mut script) => script.body.remove(0),
                Program::Module(mut module) => match module.body.remove(0) {
                    ModuleItem::Stmt(stmt) => stmt,
                    ModuleItem::ModuleDecl(_) => continue,
                },
            };
            assert!(is_traceable(&stmt), "{source}");
        }
    }

    #[test]
    fn test_simple_binding_name() {
        let Stmt::Decl(Decl::Var(var)) = first_stmt("let total = 1;") else {
            panic!("expected a variable declaration");
        };
        assert_eq!(simple_binding_name(&var.decls[0].name), Some("total"));

        let Stmt::Decl(Decl::Var(var)) = first_stmt("let { a, b } = obj;") else {
            panic!("expected a variable declaration");
        };
        assert_eq!(simple_binding_name(&var.decls[0].name), None);

        let Stmt::Decl(Decl::Var(var)) = first_stmt("const [x] = list;") else {
            panic!("expected a variable declaration");
        };
        assert_eq!(simple_binding_name(&var.decls[0].name), None);
    }

    #[test]
    fn test_labeled_body_spans() {
        assert_eq!(labeled_body_spans(&first_stmt("let a = 1;")).len(), 0);
        assert_eq!(labeled_body_spans(&first_stmt("a: { break a; }")).len(), 0);
        assert_eq!(labeled_body_spans(&first_stmt("a: for (;;) { break a; }")).len(), 1);
        assert_eq!(
            labeled_body_spans(&first_stmt("a: b: while (true) { break a; }")).len(),
            2
        );
    }
}
