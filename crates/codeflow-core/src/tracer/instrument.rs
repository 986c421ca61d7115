use std::mem;

use swc_core::common::sync::Lrc;
use swc_core::common::{SourceMap, Span, Spanned, SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::{
    BlockStmt, DoWhileStmt, EmptyStmt, ForInStmt, ForOfStmt, ForStmt, IfStmt, LabeledStmt,
    ModuleItem, Program, Stmt, VarDeclarator, WhileStmt, WithStmt,
};
use swc_core::ecma::visit::{VisitMut, VisitMutWith};
use tracing::{debug, trace};

use super::patterns::{is_traceable, labeled_body_spans, simple_binding_name};
use super::{DeclaredVariables, InstrumentStats, LineFallback};
use crate::ast;

/// Inserts tracker calls around the statements of a program
pub struct Instrumenter {
    tracker: String,
    source_map: Lrc<SourceMap>,
    fallback: LineFallback,
    fallback_counter: u32,
    declared: DeclaredVariables,
    // One slot per statement list item being visited; `trackVar` calls for
    // its declarators collect here. `None` marks a loop head.
    pending: Vec<Option<Vec<Stmt>>>,
    stats: InstrumentStats,
}

impl Instrumenter {
    pub fn new(tracker: impl Into<String>, source_map: Lrc<SourceMap>, fallback: LineFallback) -> Self {
        Self {
            tracker: tracker.into(),
            source_map,
            fallback,
            fallback_counter: 0,
            declared: DeclaredVariables::new(),
            pending: Vec::new(),
            stats: InstrumentStats::default(),
        }
    }

    pub fn stats(&self) -> &InstrumentStats {
        &self.stats
    }

    /// Names declared so far in the current (or last) traversal
    pub fn declared(&self) -> &DeclaredVariables {
        &self.declared
    }

    fn reset(&mut self) {
        self.fallback_counter = 0;
        self.declared.clear();
        self.pending.clear();
        self.stats = InstrumentStats::default();
    }

    fn line_of(&mut self, span: Span) -> u32 {
        if span.is_dummy() {
            return match self.fallback {
                LineFallback::Zero => 0,
                LineFallback::Counter => {
                    self.fallback_counter += 1;
                    self.fallback_counter
                }
            };
        }
        let line = self.source_map.lookup_char_pos(span.lo).line;
        u32::try_from(line).unwrap_or(u32::MAX)
    }

    fn track_line(&mut self, span: Span) -> Stmt {
        let line = self.line_of(span);
        self.stats.line_calls += 1;
        ast::make_track_line(&self.tracker, line, self.declared.iter())
    }

    fn instrument_list<T: StatementSlot>(&mut self, items: &mut Vec<T>) {
        let original = mem::take(items);
        let mut rewritten = Vec::with_capacity(original.len() * 2);

        for mut item in original {
            for span in item.line_spans() {
                let call = self.track_line(span);
                rewritten.push(T::from_stmt(call));
            }

            self.pending.push(Some(Vec::new()));
            item.visit_mut_with(self);
            let after = self.pending.pop().flatten().unwrap_or_default();

            rewritten.push(item);
            rewritten.extend(after.into_iter().map(T::from_stmt));
        }

        *items = rewritten;
    }

    /// Visit a loop head: declarators there are recorded but get no `trackVar`
    fn detached<F: FnOnce(&mut Self)>(&mut self, visit: F) {
        self.pending.push(None);
        visit(self);
        self.pending.pop();
    }

    /// A traceable single-statement body becomes a block so the line call
    /// has a list to live in.
    fn visit_nested_body(&mut self, body: &mut Box<Stmt>) {
        if is_traceable(&**body) {
            let span = body.span();
            let stmt = mem::replace(&mut **body, Stmt::Empty(EmptyStmt { span: DUMMY_SP }));
            **body = Stmt::Block(BlockStmt {
                span,
                ctxt: SyntaxContext::empty(),
                stmts: vec![stmt],
            });
        }
        (**body).visit_mut_with(self);
    }
}

impl VisitMut for Instrumenter {
    fn visit_mut_program(&mut self, program: &mut Program) {
        self.reset();
        program.visit_mut_children_with(self);
        self.stats.declared = self.declared.len();
        debug!(
            line_calls = self.stats.line_calls,
            var_calls = self.stats.var_calls,
            declared = self.stats.declared,
            "instrumented program"
        );
    }

    fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
        self.instrument_list(items);
    }

    fn visit_mut_stmts(&mut self, stmts: &mut Vec<Stmt>) {
        self.instrument_list(stmts);
    }

    fn visit_mut_var_declarator(&mut self, declarator: &mut VarDeclarator) {
        match simple_binding_name(&declarator.name).map(str::to_string) {
            Some(name) => {
                self.declared.insert(&name);
                let line = self.line_of(declarator.span);
                match self.pending.last_mut() {
                    Some(Some(after)) => {
                        after.push(ast::make_track_var(&self.tracker, &name, line));
                        self.stats.var_calls += 1;
                    }
                    _ => {
                        trace!(name = %name, line, "declarator has no enclosing statement slot");
                        self.stats.detached_declarators += 1;
                    }
                }
            }
            None => self.stats.skipped_patterns += 1,
        }
        declarator.visit_mut_children_with(self);
    }

    fn visit_mut_labeled_stmt(&mut self, labeled: &mut LabeledStmt) {
        // Line calls for the labeled chain were hoisted in front of the label,
        // so the body stays directly attached to it.
        (*labeled.body).visit_mut_children_with(self);
    }

    fn visit_mut_if_stmt(&mut self, stmt: &mut IfStmt) {
        stmt.test.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.cons);
        if let Some(alt) = &mut stmt.alt {
            self.visit_nested_body(alt);
        }
    }

    fn visit_mut_for_stmt(&mut self, stmt: &mut ForStmt) {
        self.detached(|this| stmt.init.visit_mut_with(this));
        stmt.test.visit_mut_with(self);
        stmt.update.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.body);
    }

    fn visit_mut_for_in_stmt(&mut self, stmt: &mut ForInStmt) {
        self.detached(|this| stmt.left.visit_mut_with(this));
        stmt.right.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.body);
    }

    fn visit_mut_for_of_stmt(&mut self, stmt: &mut ForOfStmt) {
        self.detached(|this| stmt.left.visit_mut_with(this));
        stmt.right.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.body);
    }

    fn visit_mut_while_stmt(&mut self, stmt: &mut WhileStmt) {
        stmt.test.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.body);
    }

    fn visit_mut_do_while_stmt(&mut self, stmt: &mut DoWhileStmt) {
        self.visit_nested_body(&mut stmt.body);
        stmt.test.visit_mut_with(self);
    }

    fn visit_mut_with_stmt(&mut self, stmt: &mut WithStmt) {
        stmt.obj.visit_mut_with(self);
        self.visit_nested_body(&mut stmt.body);
    }
}

/// Element of a statement list the instrumenter can splice calls into
trait StatementSlot: Sized + VisitMutWith<Instrumenter> {
    /// Spans that get a `trackLine` call in front of this item, outermost first
    fn line_spans(&self) -> Vec<Span>;

    fn from_stmt(stmt: Stmt) -> Self;
}

impl StatementSlot for Stmt {
    fn line_spans(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        if is_traceable(self) {
            spans.push(self.span());
        }
        spans.extend(labeled_body_spans(self));
        spans
    }

    fn from_stmt(stmt: Stmt) -> Self {
        stmt
    }
}

impl StatementSlot for ModuleItem {
    fn line_spans(&self) -> Vec<Span> {
        match self {
            ModuleItem::Stmt(stmt) => stmt.line_spans(),
            // imports and exports are always traceable
            ModuleItem::ModuleDecl(decl) => vec![decl.span()],
        }
    }

    fn from_stmt(stmt: Stmt) -> Self {
        ModuleItem::Stmt(stmt)
    }
}

/// Instrument `program` in place and report what was inserted
pub fn instrument_program(
    program: &mut Program,
    tracker: &str,
    source_map: Lrc<SourceMap>,
    fallback: LineFallback,
) -> InstrumentStats {
    let mut instrumenter = Instrumenter::new(tracker, source_map, fallback);
    program.visit_mut_with(&mut instrumenter);
    instrumenter.stats().clone()
}
